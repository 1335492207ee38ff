//! Shared scaffolding for the integration tests: an in-memory repository, a
//! mock identity provider, token minting, and a spawned test server.

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use admission_portal::{
    AppState, MockIdentityProvider,
    auth::Claims,
    config::{AppConfig, Env},
    create_router,
    identity::IdentityState,
    models::{
        AdmissionStats, Application, ApplicationStatus, ContentPage, Role, User,
    },
    repository::{Repository, RepositoryState},
    templates,
};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use tokio::net::TcpListener;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

/// In-memory Repository implementation. Seeded with users up front; the
/// mutable collections grow as handlers run.
#[derive(Default)]
pub struct MockRepository {
    pub users: Vec<User>,
    pub applications: Mutex<Vec<Application>>,
    pub pages: Mutex<Vec<ContentPage>>,
}

impl MockRepository {
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Repository for MockRepository {
    async fn get_user(&self, id: Uuid) -> Option<User> {
        self.users.iter().find(|u| u.id == id).cloned()
    }

    async fn create_user(&self, user: User) -> Result<User, sqlx::Error> {
        Ok(user)
    }

    async fn get_application_for(&self, user_id: Uuid) -> Option<Application> {
        self.applications
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.user_id == user_id)
            .cloned()
    }

    async fn create_application(
        &self,
        user_id: Uuid,
        program: String,
        statement: String,
    ) -> Result<Application, sqlx::Error> {
        let now = Utc::now();
        let application = Application {
            id: Uuid::new_v4(),
            user_id,
            program,
            statement,
            status: ApplicationStatus::Received,
            created_at: now,
            updated_at: now,
            applicant_email: None,
        };
        self.applications.lock().unwrap().push(application.clone());
        Ok(application)
    }

    async fn list_applications(&self) -> Vec<Application> {
        self.applications
            .lock()
            .unwrap()
            .iter()
            .map(|a| {
                let mut enriched = a.clone();
                enriched.applicant_email = self
                    .users
                    .iter()
                    .find(|u| u.id == a.user_id)
                    .map(|u| u.email.clone());
                enriched
            })
            .collect()
    }

    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Option<Application> {
        let mut applications = self.applications.lock().unwrap();
        let application = applications.iter_mut().find(|a| a.id == id)?;
        application.status = status;
        application.updated_at = Utc::now();
        Some(application.clone())
    }

    async fn get_page(&self, slug: &str) -> Option<ContentPage> {
        self.pages
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.slug == slug)
            .cloned()
    }

    async fn list_pages(&self) -> Vec<ContentPage> {
        self.pages.lock().unwrap().clone()
    }

    async fn upsert_page(
        &self,
        slug: &str,
        title: &str,
        body: &str,
    ) -> Result<ContentPage, sqlx::Error> {
        let mut pages = self.pages.lock().unwrap();
        pages.retain(|p| p.slug != slug);
        let page = ContentPage {
            slug: slug.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            updated_at: Utc::now(),
        };
        pages.push(page.clone());
        Ok(page)
    }

    async fn get_stats(&self) -> AdmissionStats {
        let applications = self.applications.lock().unwrap();
        AdmissionStats {
            total_users: self.users.len() as i64,
            total_applications: applications.len() as i64,
            pending_review: applications
                .iter()
                .filter(|a| {
                    matches!(
                        a.status,
                        ApplicationStatus::Received | ApplicationStatus::InReview
                    )
                })
                .count() as i64,
            accepted: applications
                .iter()
                .filter(|a| a.status == ApplicationStatus::Accepted)
                .count() as i64,
        }
    }
}

/// A seeded user plus its freshly minted session token.
pub fn seeded_user(role: Role) -> (User, String) {
    let user = User {
        id: Uuid::new_v4(),
        email: format!("{}@example.test", role),
        role,
    };
    let token = create_token(user.id, 3600);
    (user, token)
}

/// Mints a signed session token expiring `exp_offset` seconds from now.
pub fn create_token(user_id: Uuid, exp_offset: i64) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let claims = Claims {
        sub: user_id,
        iat: now as usize,
        exp: (now + exp_offset).max(0) as usize,
    };

    let key = EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

/// Builds an AppState around mock services. Tests default to `Env::Production`
/// so the local bypass header stays out of the way unless a test wants it.
pub fn create_app_state(env: Env, repo: MockRepository, identity: MockIdentityProvider) -> AppState {
    let mut config = AppConfig::default();
    config.env = env;
    config.jwt_secret = TEST_JWT_SECRET.to_string();

    AppState {
        repo: Arc::new(repo) as RepositoryState,
        identity: Arc::new(identity) as IdentityState,
        templates: Arc::new(templates::build().expect("templates must parse")),
        config,
    }
}

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
}

/// Binds an ephemeral port and serves the router in the background.
pub async fn spawn_app(state: AppState) -> TestApp {
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address }
}

/// A client that does not follow redirects, so tests can assert on the
/// Location header and Set-Cookie behavior of the guard.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
