//! Role-gated route access.
//!
//! Each internal route group is wrapped in one of the guard middlewares below.
//! The check is re-evaluated synchronously on every request; nothing is cached
//! and nothing is retried. Outcomes, in order:
//!
//! 1. No resolvable session: redirect to the login view, preserving the
//!    originating path in the `next` query parameter so the login flow can
//!    return the user afterward. A silent navigation, not an error.
//! 2. Session present but role not in the allowed set: attach a one-shot
//!    denial notification to the response and redirect home. Because the
//!    notification rides on this redirect response (and the first render
//!    clears it), it fires exactly once per failed authorization attempt.
//! 3. Otherwise: the request passes through unchanged.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    AppState,
    auth::resolve_session,
    flash::{self, Flash},
    models::Role,
};

/// Allowed-role sets for the portal's internal tiers. Flat containment only:
/// admin appears explicitly in the staff tiers rather than outranking them
/// through any hierarchy.
pub const APPLICANT_TIER: &[Role] = &[Role::Applicant];
pub const HELPDESK_TIER: &[Role] = &[Role::Helpdesk, Role::Admin];
pub const CONTENT_TIER: &[Role] = &[Role::Content, Role::Admin];
pub const ADMIN_TIER: &[Role] = &[Role::Admin];

/// authorize
///
/// The shared guard body. The per-tier wrappers below exist so route modules
/// can hand `middleware::from_fn_with_state` a plain named function, matching
/// how the router applies its auth layer elsewhere.
async fn authorize(state: &AppState, allowed: &[Role], req: Request, next: Next) -> Response {
    let path = req.uri().path().to_owned();

    let Some(user) = resolve_session(&state.config, &state.repo, req.headers()).await else {
        // Unauthenticated: preserve the attempted location for the login flow.
        return Redirect::to(&format!("/login?next={path}")).into_response();
    };

    if !user.role.is_member(allowed) {
        tracing::warn!(user = %user.id, role = %user.role, path = %path, "access denied");
        let denial = Flash::error(
            "Access denied",
            "You do not have permission to view that page.",
        );
        let jar = flash::set(CookieJar::new(), &denial);
        return (jar, Redirect::to("/")).into_response();
    }

    next.run(req).await
}

pub async fn applicant_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    authorize(&state, APPLICANT_TIER, req, next).await
}

pub async fn helpdesk_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    authorize(&state, HELPDESK_TIER, req, next).await
}

pub async fn content_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    authorize(&state, CONTENT_TIER, req, next).await
}

pub async fn admin_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    authorize(&state, ADMIN_TIER, req, next).await
}
