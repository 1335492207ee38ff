use crate::models::{AdmissionStats, Application, ApplicationStatus, ContentPage, User};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. This is the core
/// of the Repository Abstraction pattern, allowing the handlers and the auth
/// extractor to interact with the data layer without knowing the specific
/// implementation (Postgres, Mock, etc.).
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's task boundaries.
///
/// Expected tables (schema owned by the hosting platform, not this crate):
/// - `profiles(id uuid pk, email text, role text)`
/// - `applications(id uuid pk, user_id uuid fk, program text, statement text,
///   status text, created_at timestamptz, updated_at timestamptz)`
/// - `pages(slug text pk, title text, body text, updated_at timestamptz)`
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users / Auth ---
    async fn get_user(&self, id: Uuid) -> Option<User>;
    async fn create_user(&self, user: User) -> Result<User, sqlx::Error>;

    // --- Applications ---
    async fn get_application_for(&self, user_id: Uuid) -> Option<Application>;
    async fn create_application(
        &self,
        user_id: Uuid,
        program: String,
        statement: String,
    ) -> Result<Application, sqlx::Error>;
    // Helpdesk listing: every application, enriched with the applicant's email.
    async fn list_applications(&self) -> Vec<Application>;
    // Moderation: advances an application's lifecycle status.
    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Option<Application>;

    // --- Content Pages ---
    async fn get_page(&self, slug: &str) -> Option<ContentPage>;
    async fn list_pages(&self) -> Vec<ContentPage>;
    async fn upsert_page(
        &self,
        slug: &str,
        title: &str,
        body: &str,
    ) -> Result<ContentPage, sqlx::Error>;

    // --- Stats ---
    async fn get_stats(&self) -> AdmissionStats;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
/// Read paths log and recover (empty/None) so a transient database hiccup
/// degrades a page instead of erroring it; write paths surface the error to
/// the caller for proper response mapping.
pub struct PostgresRepository {
    pool: sqlx::PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

const APPLICATION_COLUMNS: &str =
    "id, user_id, program, statement, status, created_at, updated_at";

#[async_trait]
impl Repository for PostgresRepository {
    /// get_user
    ///
    /// Retrieves the profile data (id, email, role) needed for authentication
    /// and authorization. A row whose role text is outside the closed set fails
    /// decoding and is treated as absent.
    async fn get_user(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, User>("SELECT id, email, role FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_user error: {:?}", e);
                None
            })
    }

    /// create_user
    ///
    /// Creates the mirroring profile record after the identity provider has
    /// accepted the signup.
    async fn create_user(&self, user: User) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "INSERT INTO profiles (id, email, role) VALUES ($1, $2, $3) RETURNING id, email, role",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
    }

    async fn get_application_for(&self, user_id: Uuid) -> Option<Application> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT 1"
        );
        sqlx::query_as::<_, Application>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_application_for error: {:?}", e);
                None
            })
    }

    /// create_application
    ///
    /// Inserts a new application in the initial `received` state.
    async fn create_application(
        &self,
        user_id: Uuid,
        program: String,
        statement: String,
    ) -> Result<Application, sqlx::Error> {
        let sql = format!(
            "INSERT INTO applications (id, user_id, program, statement, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, 'received', NOW(), NOW()) \
             RETURNING {APPLICATION_COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(program)
            .bind(statement)
            .fetch_one(&self.pool)
            .await
    }

    /// list_applications
    ///
    /// Helpdesk queue: all applications, oldest first, joined with the
    /// applicant's email from `profiles`.
    async fn list_applications(&self) -> Vec<Application> {
        sqlx::query_as::<_, Application>(
            "SELECT a.id, a.user_id, a.program, a.statement, a.status, \
                    a.created_at, a.updated_at, p.email AS applicant_email \
             FROM applications a \
             JOIN profiles p ON a.user_id = p.id \
             ORDER BY a.created_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_applications error: {:?}", e);
            vec![]
        })
    }

    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Option<Application> {
        let sql = format!(
            "UPDATE applications SET status = $1, updated_at = NOW() WHERE id = $2 \
             RETURNING {APPLICATION_COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&sql)
            .bind(status.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("set_application_status error: {:?}", e);
                None
            })
    }

    async fn get_page(&self, slug: &str) -> Option<ContentPage> {
        sqlx::query_as::<_, ContentPage>(
            "SELECT slug, title, body, updated_at FROM pages WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_page error: {:?}", e);
            None
        })
    }

    async fn list_pages(&self) -> Vec<ContentPage> {
        sqlx::query_as::<_, ContentPage>(
            "SELECT slug, title, body, updated_at FROM pages ORDER BY slug ASC",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_pages error: {:?}", e);
            vec![]
        })
    }

    /// upsert_page
    ///
    /// Creates or replaces an informational page in one statement.
    async fn upsert_page(
        &self,
        slug: &str,
        title: &str,
        body: &str,
    ) -> Result<ContentPage, sqlx::Error> {
        sqlx::query_as::<_, ContentPage>(
            "INSERT INTO pages (slug, title, body, updated_at) VALUES ($1, $2, $3, NOW()) \
             ON CONFLICT (slug) DO UPDATE \
             SET title = EXCLUDED.title, body = EXCLUDED.body, updated_at = NOW() \
             RETURNING slug, title, body, updated_at",
        )
        .bind(slug)
        .bind(title)
        .bind(body)
        .fetch_one(&self.pool)
        .await
    }

    /// get_stats
    ///
    /// Compiles the counters for the administrative dashboard in a single call.
    async fn get_stats(&self) -> AdmissionStats {
        let total_users = count(&self.pool, "SELECT COUNT(*) FROM profiles").await;
        let total_applications = count(&self.pool, "SELECT COUNT(*) FROM applications").await;
        let pending_review = count(
            &self.pool,
            "SELECT COUNT(*) FROM applications WHERE status IN ('received', 'in_review')",
        )
        .await;
        let accepted = count(
            &self.pool,
            "SELECT COUNT(*) FROM applications WHERE status = 'accepted'",
        )
        .await;

        AdmissionStats {
            total_users,
            total_applications,
            pending_review,
            accepted,
        }
    }
}

async fn count(pool: &sqlx::PgPool, sql: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(sql)
        .fetch_one(pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("count query error: {:?}", e);
            0
        })
}
