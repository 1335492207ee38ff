use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Defines the routes exclusively accessible to users with the `admin` role.
/// The whole router is wrapped by `guard::admin_guard` in `create_router`; the
/// JSON stats handler additionally re-checks the role itself, keeping the
/// second layer of Defense-in-Depth that the rest of the portal follows.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin
        // The statistics overview page.
        .route("/admin", get(handlers::admin_dashboard))
        // GET /api/admin/stats
        // The same counters as JSON.
        .route("/api/admin/stats", get(handlers::api_admin_stats))
}
