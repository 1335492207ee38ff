use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Staff Router Modules
///
/// Two separately guarded route groups. They are returned individually so
/// `create_router` can wrap each in its own role layer: helpdesk routes allow
/// {helpdesk, admin}, content routes allow {content, admin}. Membership is
/// explicit in both sets; there is no role hierarchy doing that work.

/// Helpdesk: the application review queue.
pub fn helpdesk_routes() -> Router<AppState> {
    Router::new()
        // GET /helpdesk
        // All applications, oldest first, with applicant emails.
        .route("/helpdesk", get(handlers::helpdesk_queue))
        // POST /helpdesk/applications/{id}/status
        // Moves an application through its lifecycle.
        .route(
            "/helpdesk/applications/{id}/status",
            post(handlers::set_application_status),
        )
}

/// Content: the informational-page editor.
pub fn content_routes() -> Router<AppState> {
    Router::new()
        // GET /content
        // Editor view over the markdown pages (stored or fallback).
        .route("/content", get(handlers::content_index))
        // POST /content/pages/{slug}
        // Saves one of the known pages.
        .route("/content/pages/{slug}", post(handlers::update_page))
}
