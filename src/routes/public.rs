use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any client
/// (anonymous or logged-in). These are exactly the paths the layout treats as
/// public plus the gateway functions (login, registration, logout, health).
///
/// Note that the handlers still resolve the session when one is present — the
/// layout decision needs it — but never require one.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated endpoint for monitoring and load balancer checks.
        .route("/health", get(handlers::health))
        // The markdown-backed informational pages.
        .route("/", get(handlers::home))
        .route("/about", get(handlers::about))
        .route("/faq", get(handlers::faq))
        // GET /programs
        // The static program catalog.
        .route("/programs", get(handlers::programs_page))
        // GET /success
        // Post-registration confirmation.
        .route("/success", get(handlers::success))
        // Login flow. The GET form honours ?next=, carried there by the guard.
        .route("/login", get(handlers::login_form).post(handlers::login_submit))
        // Registration flow, delegated to the external identity provider.
        .route(
            "/register",
            get(handlers::register_form).post(handlers::register_submit),
        )
        // POST /logout
        // Clears the session cookie.
        .route("/logout", post(handlers::logout))
        // Public JSON API.
        .route("/api/programs", get(handlers::api_programs))
        // GET /api/me requires a session but uses the extractor's 401 directly:
        // API clients are not redirected to the login page.
        .route("/api/me", get(handlers::api_me))
}
