use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Applicant Router Module
///
/// The application dashboard for prospective students. The entire router is
/// wrapped by `guard::applicant_guard` in `create_router`: an anonymous
/// visitor is redirected to login with the attempted path preserved, and an
/// authenticated user with a different role is bounced home with a denial
/// notification.
pub fn applicant_routes() -> Router<AppState> {
    Router::new()
        // GET /dashboard
        // The applicant's own application status, or the submission form.
        .route("/dashboard", get(handlers::dashboard))
        // POST /dashboard/apply
        // Submits an admission application (one per user).
        .route("/dashboard/apply", post(handlers::apply_submit))
}
