/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules,
/// enforcing a Defense-in-Depth strategy. Access control is applied explicitly
/// at the module level (via the guard layers in `create_router`), preventing
/// accidental exposure of protected endpoints.

/// Routes accessible to all visitors: the informational pages, the
/// registration/login flow, and the public JSON API.
pub mod public;

/// Routes for the `applicant` role: the application dashboard.
pub mod applicant;

/// Routes for staff roles: the helpdesk queue and the content manager.
/// Admin is included in both allowed sets by explicit membership.
pub mod staff;

/// Routes restricted exclusively to users with the `admin` role.
pub mod admin;
