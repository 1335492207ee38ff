use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Access Control Types ---

/// Role
///
/// The flat categorical label identifying a user's permission class. The set is
/// closed: every authenticated user carries exactly one of these values, and
/// there is no hierarchy or inheritance between them. Authorization everywhere
/// in the portal reduces to set containment over this enum (see [`Role::is_member`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full oversight: moderation, statistics, and every staff surface.
    Admin,
    /// Reviews and progresses submitted applications.
    Helpdesk,
    /// Edits the markdown content behind the informational pages.
    Content,
    /// A prospective student; the only role the public form can register.
    #[default]
    Applicant,
}

/// RoleParseError
///
/// Raised when a stored role string does not match the closed set. Surfacing this
/// as a real error (rather than defaulting) means a corrupted profile row fails
/// authentication instead of silently downgrading or upgrading the user.
#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct RoleParseError(String);

impl Role {
    /// The lowercase wire/storage form of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Helpdesk => "helpdesk",
            Role::Content => "content",
            Role::Applicant => "applicant",
        }
    }

    /// is_member
    ///
    /// The pure set-containment predicate behind every route guard. Deliberately
    /// independent of any string representation so it is trivially testable:
    /// a role is authorized iff it appears in the allowed set, nothing more.
    pub fn is_member(&self, allowed: &[Role]) -> bool {
        allowed.contains(self)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Role {
    type Error = RoleParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(Role::Admin),
            "helpdesk" => Ok(Role::Helpdesk),
            "content" => Ok(Role::Content),
            "applicant" => Ok(Role::Applicant),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = RoleParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Role::try_from(value.as_str())
    }
}

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The user's canonical identity record mirrored from the external identity
/// provider into the `profiles` table. This codebase only ever reads the role;
/// identity lifecycle (passwords, verification) is owned by the provider.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
pub struct User {
    // Primary key, shared with the provider's user id.
    pub id: Uuid,
    pub email: String,
    // The RBAC field. Stored as lowercase text.
    #[sqlx(try_from = "String")]
    pub role: Role,
}

/// ApplicationStatus
///
/// Lifecycle of a submitted admission application. Helpdesk staff move
/// applications through this pipeline; applicants only observe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Received,
    InReview,
    Accepted,
    Declined,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown application status: {0}")]
pub struct StatusParseError(String);

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Received => "received",
            ApplicationStatus::InReview => "in_review",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Declined => "declined",
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ApplicationStatus {
    type Error = StatusParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "received" => Ok(ApplicationStatus::Received),
            "in_review" => Ok(ApplicationStatus::InReview),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "declined" => Ok(ApplicationStatus::Declined),
            other => Err(StatusParseError(other.to_string())),
        }
    }
}

/// Application
///
/// An admission application row from the `applications` table. The optional
/// `applicant_email` is populated by a JOIN in the helpdesk listing query and
/// left empty elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
pub struct Application {
    pub id: Uuid,
    pub user_id: Uuid,
    // Slug of the program applied to (see the static catalog in `programs`).
    pub program: String,
    pub statement: String,
    #[sqlx(try_from = "String")]
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(default)]
    pub applicant_email: Option<String>,
}

/// ContentPage
///
/// An editable markdown document backing one of the informational pages.
/// The body is raw markdown; rendering happens at request time through the
/// defensive wrapper in the `markdown` module.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct ContentPage {
    pub slug: String,
    pub title: String,
    pub body: String,
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input for the public registration form. The password is only passed through
/// to the external identity provider and never persisted or logged here.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// LoginForm
///
/// Input for the login form. `next` carries the originating location preserved
/// by the route guard so the login flow can return the user afterward.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

/// ApplyForm
///
/// An applicant's admission submission from the dashboard.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplyForm {
    pub program: String,
    pub statement: String,
}

/// StatusForm
///
/// Helpdesk moderation input: the new lifecycle status for an application.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusForm {
    pub status: ApplicationStatus,
}

/// UpdatePageForm
///
/// Content editor input for an informational page.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePageForm {
    pub title: String,
    pub body: String,
}

// --- Dashboard & Profile Schemas (Output) ---

/// AdmissionStats
///
/// Output schema for the administrative statistics dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct AdmissionStats {
    pub total_users: i64,
    pub total_applications: i64,
    /// Applications still in `received` or `in_review`.
    pub pending_review: i64,
    pub accepted: i64,
}

/// UserProfile
///
/// Output schema for the authenticated user's profile (GET /api/me).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ROLES: [Role; 4] = [Role::Admin, Role::Helpdesk, Role::Content, Role::Applicant];

    #[test]
    fn role_round_trips_through_storage_form() {
        for role in ALL_ROLES {
            assert_eq!(Role::try_from(role.as_str()).unwrap(), role);
            assert_eq!(Role::try_from(role.to_string()).unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_rejected_not_defaulted() {
        assert!(Role::try_from("superuser").is_err());
        assert!(Role::try_from("").is_err());
        // Case matters: storage form is lowercase only.
        assert!(Role::try_from("Admin").is_err());
    }

    #[test]
    fn membership_is_exact_containment() {
        let staff = [Role::Helpdesk, Role::Admin];
        assert!(Role::Admin.is_member(&staff));
        assert!(Role::Helpdesk.is_member(&staff));
        assert!(!Role::Content.is_member(&staff));
        assert!(!Role::Applicant.is_member(&staff));

        // No role is a member of the empty set, and every role is a member of
        // the full set. There is no hierarchy that could bend either edge.
        for role in ALL_ROLES {
            assert!(!role.is_member(&[]));
            assert!(role.is_member(&ALL_ROLES));
        }
    }

    #[test]
    fn application_status_round_trips() {
        for status in [
            ApplicationStatus::Received,
            ApplicationStatus::InReview,
            ApplicationStatus::Accepted,
            ApplicationStatus::Declined,
        ] {
            assert_eq!(
                ApplicationStatus::try_from(status.as_str().to_string()).unwrap(),
                status
            );
        }
        assert!(ApplicationStatus::try_from("archived".to_string()).is_err());
    }
}
