//! Session-aware layout control.
//!
//! The only layout decision the portal makes globally is whether a page shows
//! the public site header. Everything here is a pure function of the request
//! path and authentication state, recomputed on every request.

/// The routes reachable without authentication. This is an inline literal set,
/// not derived from the router: the guard modules are the source of truth for
/// access control, this list only drives the header decision.
pub const PUBLIC_PATHS: [&str; 7] = [
    "/",
    "/about",
    "/programs",
    "/faq",
    "/login",
    "/register",
    "/success",
];

/// show_header
///
/// The header is shown if the current path is public, OR the visitor is not
/// authenticated. An authenticated user on an internal path gets the dashboard
/// chrome instead, which carries its own navigation.
pub fn show_header(path: &str, authenticated: bool) -> bool {
    PUBLIC_PATHS.contains(&path) || !authenticated
}
