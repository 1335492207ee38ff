use crate::{
    AppState,
    auth::{self, AuthUser, MaybeAuthUser},
    error::PortalError,
    flash::{self, Flash},
    guard,
    identity::IdentityError,
    layout, markdown,
    models::{
        AdmissionStats, ApplyForm, LoginForm, RegisterRequest, Role, StatusForm, UpdatePageForm,
        User, UserProfile,
    },
    programs,
    templates::{self, flash_value},
};
use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use uuid::Uuid;

// --- Static Page Content (fallbacks) ---

// Informational pages are editable by the content role and stored in the
// repository. When a page has never been saved, these defaults render instead,
// so a fresh deployment is never blank.
const PAGE_SLUGS: [&str; 3] = ["home", "about", "faq"];

fn fallback_page(slug: &str) -> (&'static str, &'static str) {
    match slug {
        "home" => (
            "Welcome",
            "# Welcome to Hillcrest Academy\n\nWe are accepting applications for the upcoming \
             school year. Browse our [programs](/programs) or [register](/register) to begin.",
        ),
        "about" => (
            "About the Academy",
            "# About the Academy\n\nHillcrest Academy is an independent day school serving \
             grades 9 through 12.\n\nOur admission process is need-blind and rolling.",
        ),
        _ => (
            "Frequently Asked Questions",
            "# Frequently Asked Questions\n\n**When is the application deadline?**\n\n\
             Applications are reviewed on a rolling basis.\n\n**Is there an application fee?**\n\n\
             No.",
        ),
    }
}

// --- Shared Rendering Helpers ---

/// Builds the layout portion of every template context: the header decision,
/// the authentication flag the navigation uses, and the pending flash.
/// Recomputed per request; the header rule is the pure function in `layout`.
fn render_shell(
    state: &AppState,
    template: &str,
    path: &str,
    authenticated: bool,
    flash: Option<&Flash>,
    extra: minijinja::Value,
) -> Result<Html<String>, PortalError> {
    let base = minijinja::context! {
        show_header => layout::show_header(path, authenticated),
        authenticated => authenticated,
        flash => flash_value(flash),
    };
    templates::render(
        &state.templates,
        template,
        minijinja::context! { ..extra, ..base },
    )
}

/// The post-login landing page for each role.
fn landing(role: Role) -> &'static str {
    match role {
        Role::Admin => "/admin",
        Role::Helpdesk => "/helpdesk",
        Role::Content => "/content",
        Role::Applicant => "/dashboard",
    }
}

/// Only same-origin absolute paths may be used as a post-login destination.
/// Anything else (full URLs, protocol-relative `//host` forms) is discarded,
/// closing the open-redirect hole the `next` parameter would otherwise be.
fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//"))
}

// --- Public Pages ---

/// content_page
///
/// [Public Route] Shared handler body for the markdown-backed informational
/// pages. The stored body (or fallback) goes through the defensive markdown
/// wrapper; a rendering failure therefore degrades to raw text, never a 500.
async fn content_page(
    state: &AppState,
    jar: CookieJar,
    user: Option<&AuthUser>,
    path: &str,
    slug: &str,
) -> Result<(CookieJar, Html<String>), PortalError> {
    let (jar, pending) = flash::take(jar);

    let (title, body) = match state.repo.get_page(slug).await {
        Some(page) => (page.title, page.body),
        None => {
            let (title, body) = fallback_page(slug);
            (title.to_string(), body.to_string())
        }
    };

    let html = render_shell(
        state,
        "page.html",
        path,
        user.is_some(),
        pending.as_ref(),
        minijinja::context! {
            title => title,
            body_html => markdown::render(&body),
        },
    )?;
    Ok((jar, html))
}

pub async fn home(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    jar: CookieJar,
) -> Result<impl IntoResponse, PortalError> {
    content_page(&state, jar, user.as_ref(), "/", "home").await
}

pub async fn about(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    jar: CookieJar,
) -> Result<impl IntoResponse, PortalError> {
    content_page(&state, jar, user.as_ref(), "/about", "about").await
}

pub async fn faq(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    jar: CookieJar,
) -> Result<impl IntoResponse, PortalError> {
    content_page(&state, jar, user.as_ref(), "/faq", "faq").await
}

/// [Public Route] The program catalog page, fed from the static catalog.
pub async fn programs_page(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    jar: CookieJar,
) -> Result<impl IntoResponse, PortalError> {
    let (jar, pending) = flash::take(jar);
    let html = render_shell(
        &state,
        "programs.html",
        "/programs",
        user.is_some(),
        pending.as_ref(),
        minijinja::context! { programs => programs::CATALOG },
    )?;
    Ok((jar, html))
}

/// [Public Route] Post-registration confirmation page.
pub async fn success(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    jar: CookieJar,
) -> Result<impl IntoResponse, PortalError> {
    let (jar, pending) = flash::take(jar);
    let html = render_shell(
        &state,
        "success.html",
        "/success",
        user.is_some(),
        pending.as_ref(),
        minijinja::context! {},
    )?;
    Ok((jar, html))
}

#[derive(Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// [Public Route] The login form. `next` arrives from the route guard and is
/// carried through the form as a hidden field.
pub async fn login_form(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    jar: CookieJar,
    Query(query): Query<LoginQuery>,
) -> Result<impl IntoResponse, PortalError> {
    // An already-authenticated visitor has nothing to do here.
    if let Some(user) = user {
        return Ok(Redirect::to(landing(user.role)).into_response());
    }

    let (jar, pending) = flash::take(jar);
    let html = render_shell(
        &state,
        "login.html",
        "/login",
        false,
        pending.as_ref(),
        minijinja::context! { next => safe_next(query.next.as_deref()) },
    )?;
    Ok((jar, html).into_response())
}

/// login_submit
///
/// [Public Route] Credential verification is delegated to the external
/// identity provider; on success the portal issues its own signed session
/// cookie and returns the user to the location preserved by the guard (or the
/// role's landing page).
pub async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse, PortalError> {
    let user_id = match state.identity.sign_in(&form.email, &form.password).await {
        Ok(id) => id,
        Err(IdentityError::Rejected(_)) => {
            let jar = flash::set(
                jar,
                &Flash::error("Login failed", "Email or password was not recognized."),
            );
            return Ok((jar, Redirect::to("/login")).into_response());
        }
        Err(IdentityError::Unavailable(detail)) => {
            return Err(PortalError::Identity(detail));
        }
    };

    // The provider accepted the credentials, but the portal needs the local
    // profile for the role before it can open a session.
    let Some(user) = state.repo.get_user(user_id).await else {
        tracing::warn!(user = %user_id, "provider login without local profile");
        let jar = flash::set(
            jar,
            &Flash::error("Login failed", "No portal profile exists for this account."),
        );
        return Ok((jar, Redirect::to("/login")).into_response());
    };

    let token = auth::issue_token(user.id, &state.config.jwt_secret)?;
    let jar = jar.add(auth::session_cookie(token, &state.config.env));

    let destination = safe_next(form.next.as_deref()).unwrap_or(landing(user.role));
    Ok((jar, Redirect::to(destination)).into_response())
}

/// [Public Route] The registration form.
pub async fn register_form(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    jar: CookieJar,
) -> Result<impl IntoResponse, PortalError> {
    let (jar, pending) = flash::take(jar);
    let html = render_shell(
        &state,
        "register.html",
        "/register",
        user.is_some(),
        pending.as_ref(),
        minijinja::context! {},
    )?;
    Ok((jar, html))
}

/// register_submit
///
/// [Public Route] Handles initial user registration via the external identity
/// provider.
///
/// *Flow*: calls the provider's signup endpoint, retrieves the canonical user
/// id, then creates the mirrored record in the local `profiles` table. This
/// keeps primary keys synchronized between the provider and our schema. The
/// public form only ever mints the `applicant` role; staff accounts are
/// provisioned out-of-band.
pub async fn register_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterRequest>,
) -> Result<impl IntoResponse, PortalError> {
    let user_id = match state.identity.sign_up(&form.email, &form.password).await {
        Ok(id) => id,
        Err(IdentityError::Rejected(reason)) => {
            tracing::debug!(reason = %reason, "registration rejected by provider");
            let jar = flash::set(
                jar,
                &Flash::error(
                    "Registration failed",
                    "That email may already be registered, or the password is too weak.",
                ),
            );
            return Ok((jar, Redirect::to("/register")).into_response());
        }
        Err(IdentityError::Unavailable(detail)) => {
            return Err(PortalError::Identity(detail));
        }
    };

    state
        .repo
        .create_user(User {
            id: user_id,
            email: form.email,
            role: Role::Applicant,
        })
        .await?;

    Ok(Redirect::to("/success").into_response())
}

/// [Public Route] Clears the session cookie. Logging out is always allowed,
/// session or not.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let jar = jar.add(auth::clear_session_cookie(&state.config.env));
    let jar = flash::set(jar, &Flash::info("Logged out", "Your session has ended."));
    (jar, Redirect::to("/"))
}

/// health
///
/// [Public Route] Liveness endpoint for monitors and load balancers.
pub async fn health() -> &'static str {
    "ok"
}

// --- Public JSON API ---

/// get_programs
///
/// [Public Route] The program catalog as JSON.
#[utoipa::path(
    get,
    path = "/api/programs",
    responses((status = 200, description = "Program catalog", body = [programs::Program]))
)]
pub async fn api_programs() -> Json<Vec<programs::Program>> {
    Json(programs::CATALOG.to_vec())
}

/// get_me
///
/// [Authenticated Route] The authenticated user's profile. Uses the extractor's
/// 401 rejection directly; an API caller should not be redirected to a login
/// page.
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Profile", body = UserProfile),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn api_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, StatusCode> {
    let user = state
        .repo
        .get_user(id)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;
    Ok(Json(UserProfile {
        id: user.id,
        email: user.email,
        role: user.role,
    }))
}

// --- Applicant Tier ---

/// dashboard
///
/// [Applicant Route] Shows the applicant's submitted application, or the
/// submission form when none exists yet.
pub async fn dashboard(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, PortalError> {
    let (jar, pending) = flash::take(jar);
    let application = state.repo.get_application_for(id).await;

    let html = render_shell(
        &state,
        "dashboard.html",
        "/dashboard",
        true,
        pending.as_ref(),
        minijinja::context! {
            application => application,
            programs => programs::CATALOG,
        },
    )?;
    Ok((jar, html))
}

/// apply_submit
///
/// [Applicant Route] Submits an admission application. One application per
/// user: resubmission is turned away with a notice rather than an error.
pub async fn apply_submit(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ApplyForm>,
) -> Result<impl IntoResponse, PortalError> {
    if programs::find(&form.program).is_none() {
        let jar = flash::set(
            jar,
            &Flash::error("Unknown program", "Please choose a program from the list."),
        );
        return Ok((jar, Redirect::to("/dashboard")));
    }

    if state.repo.get_application_for(id).await.is_some() {
        let jar = flash::set(
            jar,
            &Flash::info("Already applied", "You have already submitted an application."),
        );
        return Ok((jar, Redirect::to("/dashboard")));
    }

    state
        .repo
        .create_application(id, form.program, form.statement)
        .await?;

    let jar = flash::set(
        jar,
        &Flash::success("Application received", "We will be in touch about next steps."),
    );
    Ok((jar, Redirect::to("/dashboard")))
}

// --- Helpdesk Tier ---

/// helpdesk_queue
///
/// [Helpdesk Route] The moderation queue: every application with the
/// applicant's email joined in.
pub async fn helpdesk_queue(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, PortalError> {
    let (jar, pending) = flash::take(jar);
    let applications = state.repo.list_applications().await;

    let html = render_shell(
        &state,
        "helpdesk.html",
        "/helpdesk",
        true,
        pending.as_ref(),
        minijinja::context! { applications => applications },
    )?;
    Ok((jar, html))
}

/// set_application_status
///
/// [Helpdesk Route] Advances an application through its lifecycle.
pub async fn set_application_status(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Form(form): Form<StatusForm>,
) -> impl IntoResponse {
    match state.repo.set_application_status(id, form.status).await {
        Some(app) => {
            let jar = flash::set(
                jar,
                &Flash::success("Status updated", "The applicant will see the change."),
            );
            tracing::info!(application = %app.id, status = %app.status, "application status changed");
            (jar, Redirect::to("/helpdesk"))
        }
        None => {
            let jar = flash::set(
                jar,
                &Flash::error("Not found", "That application no longer exists."),
            );
            (jar, Redirect::to("/helpdesk"))
        }
    }
}

// --- Content Tier ---

/// content_index
///
/// [Content Route] Editor view over the informational pages. Pages never saved
/// yet are listed with their fallback content so every slug is editable.
pub async fn content_index(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, PortalError> {
    let (jar, pending) = flash::take(jar);
    let stored = state.repo.list_pages().await;

    let pages: Vec<minijinja::Value> = PAGE_SLUGS
        .iter()
        .map(|slug| {
            match stored.iter().find(|page| page.slug == *slug) {
                Some(page) => minijinja::context! {
                    slug => page.slug,
                    title => page.title,
                    body => page.body,
                    updated_at => page.updated_at,
                },
                None => {
                    let (title, body) = fallback_page(slug);
                    minijinja::context! {
                        slug => slug,
                        title => title,
                        body => body,
                        updated_at => "never",
                    }
                }
            }
        })
        .collect();

    let html = render_shell(
        &state,
        "content.html",
        "/content",
        true,
        pending.as_ref(),
        minijinja::context! { pages => pages },
    )?;
    Ok((jar, html))
}

/// update_page
///
/// [Content Route] Saves an informational page. Only the known slugs are
/// writable; anything else is turned away.
pub async fn update_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(slug): Path<String>,
    Form(form): Form<UpdatePageForm>,
) -> Result<impl IntoResponse, PortalError> {
    if !PAGE_SLUGS.contains(&slug.as_str()) {
        let jar = flash::set(
            jar,
            &Flash::error("Unknown page", "That page is not managed here."),
        );
        return Ok((jar, Redirect::to("/content")));
    }

    state.repo.upsert_page(&slug, &form.title, &form.body).await?;

    let jar = flash::set(jar, &Flash::success("Saved", "Page updated."));
    Ok((jar, Redirect::to("/content")))
}

// --- Admin Tier ---

/// admin_dashboard
///
/// [Admin Route] The statistics overview page.
pub async fn admin_dashboard(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, PortalError> {
    let (jar, pending) = flash::take(jar);
    let stats = state.repo.get_stats().await;

    let html = render_shell(
        &state,
        "admin.html",
        "/admin",
        true,
        pending.as_ref(),
        minijinja::context! { stats => stats },
    )?;
    Ok((jar, html))
}

/// get_admin_stats
///
/// [Admin Route] Statistics as JSON. The admin guard already gates the route;
/// the explicit role check here is the second layer of Defense-in-Depth,
/// matching the page handlers' posture.
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Stats", body = AdmissionStats),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn api_admin_stats(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AdmissionStats>, StatusCode> {
    if !role.is_member(guard::ADMIN_TIER) {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(Json(state.repo.get_stats().await))
}
