//! Server-side page rendering.
//!
//! Templates are embedded at compile time so the binary has no runtime file
//! dependency. The environment is built once at startup and shared through
//! the application state.

use axum::response::Html;
use minijinja::Environment;
use std::sync::Arc;

use crate::error::PortalError;
use crate::flash::Flash;

/// TemplateState
///
/// The concrete type used to share the template environment across the
/// application state.
pub type TemplateState = Arc<Environment<'static>>;

/// build
///
/// Assembles the minijinja environment with every page template registered.
pub fn build() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("base.html", include_str!("../templates/base.html"))?;
    env.add_template("page.html", include_str!("../templates/page.html"))?;
    env.add_template("programs.html", include_str!("../templates/programs.html"))?;
    env.add_template("login.html", include_str!("../templates/login.html"))?;
    env.add_template("register.html", include_str!("../templates/register.html"))?;
    env.add_template("success.html", include_str!("../templates/success.html"))?;
    env.add_template("dashboard.html", include_str!("../templates/dashboard.html"))?;
    env.add_template("helpdesk.html", include_str!("../templates/helpdesk.html"))?;
    env.add_template("content.html", include_str!("../templates/content.html"))?;
    env.add_template("admin.html", include_str!("../templates/admin.html"))?;
    Ok(env)
}

/// render
///
/// Renders a registered template with the given context into an HTML response.
pub fn render(
    env: &Environment<'static>,
    name: &str,
    ctx: minijinja::Value,
) -> Result<Html<String>, PortalError> {
    let template = env.get_template(name)?;
    Ok(Html(template.render(ctx)?))
}

/// flash_value
///
/// Converts an optional flash message into the template-facing value shape.
pub fn flash_value(flash: Option<&Flash>) -> minijinja::Value {
    match flash {
        Some(flash) => minijinja::context! {
            severity => flash.severity.as_str(),
            title => flash.title,
            description => flash.description,
        },
        None => minijinja::Value::from(()),
    }
}
