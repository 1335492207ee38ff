//! Server-rendered page and JSON API tests: layout header visibility, the
//! markdown-backed informational pages, and the registration, login, and
//! application flows against the mock services.

mod common;

use admission_portal::{MockIdentityProvider, config::Env, models::Role};
use chrono::Utc;
use common::{MockRepository, client, create_app_state, seeded_user, spawn_app};
use reqwest::{StatusCode, header};
use std::sync::Mutex;
use uuid::Uuid;

fn cookie_header(token: &str) -> String {
    format!("portal_session={}", token)
}

// --- Layout ---

#[tokio::test]
async fn public_home_page_renders_with_the_header() {
    let state = create_app_state(
        Env::Production,
        MockRepository::default(),
        MockIdentityProvider::new(),
    );
    let app = spawn_app(state).await;

    let response = client().get(format!("{}/", app.address)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.text().await.unwrap();
    assert!(body.contains("id=\"site-header\""));
    // Fallback content renders when nothing has been saved yet.
    assert!(body.contains("Welcome to Hillcrest Academy"));
    // Anonymous visitors see the login link, not the logout button.
    assert!(body.contains("href=\"/login\""));
    assert!(!body.contains("action=\"/logout\""));
}

#[tokio::test]
async fn authenticated_visitor_keeps_the_header_on_public_pages() {
    let (user, token) = seeded_user(Role::Applicant);
    let state = create_app_state(
        Env::Production,
        MockRepository::with_users(vec![user]),
        MockIdentityProvider::new(),
    );
    let app = spawn_app(state).await;

    let response = client()
        .get(format!("{}/about", app.address))
        .header(header::COOKIE, cookie_header(&token))
        .send()
        .await
        .unwrap();
    let body = response.text().await.unwrap();

    assert!(body.contains("id=\"site-header\""));
    // The navigation flips to the session form.
    assert!(body.contains("action=\"/logout\""));
}

#[tokio::test]
async fn internal_dashboard_hides_the_public_header() {
    let (user, token) = seeded_user(Role::Applicant);
    let state = create_app_state(
        Env::Production,
        MockRepository::with_users(vec![user]),
        MockIdentityProvider::new(),
    );
    let app = spawn_app(state).await;

    let response = client()
        .get(format!("{}/dashboard", app.address))
        .header(header::COOKIE, cookie_header(&token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.text().await.unwrap();
    assert!(!body.contains("id=\"site-header\""));
    assert!(body.contains("You have not applied yet"));
}

#[tokio::test]
async fn stored_page_overrides_the_fallback() {
    let now = Utc::now();
    let repo = MockRepository {
        pages: Mutex::new(vec![admission_portal::models::ContentPage {
            slug: "home".to_string(),
            title: "Enrolment open".to_string(),
            body: "## Enrolment is **open**".to_string(),
            updated_at: now,
        }]),
        ..MockRepository::default()
    };
    let state = create_app_state(Env::Production, repo, MockIdentityProvider::new());
    let app = spawn_app(state).await;

    let body = client()
        .get(format!("{}/", app.address))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    // The stored markdown is rendered, the fallback is gone.
    assert!(body.contains("<strong>open</strong>"));
    assert!(!body.contains("Welcome to Hillcrest Academy"));
}

// --- Login / logout ---

#[tokio::test]
async fn login_form_carries_the_preserved_next_location() {
    let state = create_app_state(
        Env::Production,
        MockRepository::default(),
        MockIdentityProvider::new(),
    );
    let app = spawn_app(state).await;

    let body = client()
        .get(format!("{}/login?next=/dashboard", app.address))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains("name=\"next\" value=\"/dashboard\""));
}

#[tokio::test]
async fn login_form_discards_an_offsite_next_location() {
    let state = create_app_state(
        Env::Production,
        MockRepository::default(),
        MockIdentityProvider::new(),
    );
    let app = spawn_app(state).await;

    let body = client()
        .get(format!("{}/login?next=//evil.example", app.address))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(!body.contains("name=\"next\""));
}

#[tokio::test]
async fn successful_login_sets_a_session_and_lands_on_the_role_page() {
    let (user, _) = seeded_user(Role::Applicant);
    let identity = MockIdentityProvider::with_user(&user.email, user.id);
    let state = create_app_state(
        Env::Production,
        MockRepository::with_users(vec![user.clone()]),
        identity,
    );
    let app = spawn_app(state).await;

    let response = client()
        .post(format!("{}/login", app.address))
        .form(&[("email", user.email.as_str()), ("password", "hunter2")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/dashboard");

    let set_cookie = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect::<Vec<_>>()
        .join("; ");
    assert!(set_cookie.contains("portal_session="));
    assert!(set_cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn successful_login_honours_the_next_location() {
    let (user, _) = seeded_user(Role::Applicant);
    let identity = MockIdentityProvider::with_user(&user.email, user.id);
    let state = create_app_state(
        Env::Production,
        MockRepository::with_users(vec![user.clone()]),
        identity,
    );
    let app = spawn_app(state).await;

    let response = client()
        .post(format!("{}/login", app.address))
        .form(&[
            ("email", user.email.as_str()),
            ("password", "hunter2"),
            ("next", "/programs"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/programs");
}

#[tokio::test]
async fn rejected_credentials_return_to_the_login_form_with_a_notice() {
    let state = create_app_state(
        Env::Production,
        MockRepository::default(),
        MockIdentityProvider::new_failing(),
    );
    let app = spawn_app(state).await;

    let response = client()
        .post(format!("{}/login", app.address))
        .form(&[("email", "nobody@example.test"), ("password", "wrong")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
    let set_cookie = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect::<Vec<_>>()
        .join("; ");
    assert!(set_cookie.contains("portal_flash="));
}

#[tokio::test]
async fn provider_login_without_a_local_profile_is_turned_away() {
    // The provider knows the account but no profile row exists here.
    let identity = MockIdentityProvider::with_user("ghost@example.test", Uuid::new_v4());
    let state = create_app_state(Env::Production, MockRepository::default(), identity);
    let app = spawn_app(state).await;

    let response = client()
        .post(format!("{}/login", app.address))
        .form(&[("email", "ghost@example.test"), ("password", "hunter2")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
}

#[tokio::test]
async fn logout_clears_the_session_cookie() {
    let (user, token) = seeded_user(Role::Applicant);
    let state = create_app_state(
        Env::Production,
        MockRepository::with_users(vec![user]),
        MockIdentityProvider::new(),
    );
    let app = spawn_app(state).await;

    let response = client()
        .post(format!("{}/logout", app.address))
        .header(header::COOKIE, cookie_header(&token))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
    let set_cookie = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect::<Vec<_>>()
        .join("; ");
    assert!(set_cookie.contains("portal_session=;") || set_cookie.contains("portal_session=\""));
    assert!(set_cookie.contains("Max-Age=0"));
}

// --- Registration ---

#[tokio::test]
async fn registration_creates_a_profile_and_redirects_to_success() {
    let state = create_app_state(
        Env::Production,
        MockRepository::default(),
        MockIdentityProvider::new(),
    );
    let app = spawn_app(state).await;

    let response = client()
        .post(format!("{}/register", app.address))
        .form(&[("email", "new@example.test"), ("password", "long-enough-pw")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/success");
}

#[tokio::test]
async fn refused_registration_returns_to_the_form() {
    let state = create_app_state(
        Env::Production,
        MockRepository::default(),
        MockIdentityProvider::new_failing(),
    );
    let app = spawn_app(state).await;

    let response = client()
        .post(format!("{}/register", app.address))
        .form(&[("email", "dup@example.test"), ("password", "pw")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/register");
}

// --- Application lifecycle ---

#[tokio::test]
async fn applicant_submits_once_and_sees_the_status_afterward() {
    let (user, token) = seeded_user(Role::Applicant);
    let state = create_app_state(
        Env::Production,
        MockRepository::with_users(vec![user]),
        MockIdentityProvider::new(),
    );
    let app = spawn_app(state).await;
    let http = client();

    let response = http
        .post(format!("{}/dashboard/apply", app.address))
        .header(header::COOKIE, cookie_header(&token))
        .form(&[("program", "stem"), ("statement", "I enjoy mathematics.")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/dashboard");

    let body = http
        .get(format!("{}/dashboard", app.address))
        .header(header::COOKIE, cookie_header(&token))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("data-status=\"received\""));
    assert!(body.contains("stem"));

    // A second submission is turned away, leaving the first in place.
    let response = http
        .post(format!("{}/dashboard/apply", app.address))
        .header(header::COOKIE, cookie_header(&token))
        .form(&[("program", "arts"), ("statement", "Changed my mind.")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let body = http
        .get(format!("{}/dashboard", app.address))
        .header(header::COOKIE, cookie_header(&token))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("stem"));
}

#[tokio::test]
async fn unknown_program_is_rejected_before_storage() {
    let (user, token) = seeded_user(Role::Applicant);
    let state = create_app_state(
        Env::Production,
        MockRepository::with_users(vec![user]),
        MockIdentityProvider::new(),
    );
    let app = spawn_app(state).await;
    let http = client();

    let response = http
        .post(format!("{}/dashboard/apply", app.address))
        .header(header::COOKIE, cookie_header(&token))
        .form(&[("program", "underwater-basketweaving"), ("statement", "x")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let body = http
        .get(format!("{}/dashboard", app.address))
        .header(header::COOKIE, cookie_header(&token))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("You have not applied yet"));
}

#[tokio::test]
async fn helpdesk_reviews_the_queue_and_updates_a_status() {
    let (applicant, applicant_token) = seeded_user(Role::Applicant);
    let (staff, staff_token) = seeded_user(Role::Helpdesk);
    let state = create_app_state(
        Env::Production,
        MockRepository::with_users(vec![applicant.clone(), staff]),
        MockIdentityProvider::new(),
    );
    let app = spawn_app(state).await;
    let http = client();

    http.post(format!("{}/dashboard/apply", app.address))
        .header(header::COOKIE, cookie_header(&applicant_token))
        .form(&[("program", "ib"), ("statement", "Diploma candidate.")])
        .send()
        .await
        .unwrap();

    // The queue shows the application with the applicant's email joined in.
    let body = http
        .get(format!("{}/helpdesk", app.address))
        .header(header::COOKIE, cookie_header(&staff_token))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains(&applicant.email));
    assert!(body.contains("ib"));

    // Pull the application id out of the status form's action URL.
    let marker = "/helpdesk/applications/";
    let start = body.find(marker).expect("status form present") + marker.len();
    let id = &body[start..start + 36];

    let response = http
        .post(format!("{}/helpdesk/applications/{}/status", app.address, id))
        .header(header::COOKIE, cookie_header(&staff_token))
        .form(&[("status", "accepted")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/helpdesk");

    // The applicant sees the new status.
    let body = http
        .get(format!("{}/dashboard", app.address))
        .header(header::COOKIE, cookie_header(&applicant_token))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("data-status=\"accepted\""));
}

// --- Content editing ---

#[tokio::test]
async fn content_editor_saves_a_page_that_the_public_site_serves() {
    let (editor, token) = seeded_user(Role::Content);
    let state = create_app_state(
        Env::Production,
        MockRepository::with_users(vec![editor]),
        MockIdentityProvider::new(),
    );
    let app = spawn_app(state).await;
    let http = client();

    let response = http
        .post(format!("{}/content/pages/faq", app.address))
        .header(header::COOKIE, cookie_header(&token))
        .form(&[
            ("title", "Questions"),
            ("body", "**Deadline** is March 1."),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/content");

    let body = http.get(format!("{}/faq", app.address)).send().await.unwrap().text().await.unwrap();
    assert!(body.contains("<strong>Deadline</strong>"));
}

#[tokio::test]
async fn unknown_slug_is_not_writable() {
    let (editor, token) = seeded_user(Role::Content);
    let state = create_app_state(
        Env::Production,
        MockRepository::with_users(vec![editor]),
        MockIdentityProvider::new(),
    );
    let app = spawn_app(state).await;

    let response = client()
        .post(format!("{}/content/pages/secrets", app.address))
        .header(header::COOKIE, cookie_header(&token))
        .form(&[("title", "x"), ("body", "y")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/content");
}

// --- JSON API ---

#[tokio::test]
async fn health_endpoint_answers_ok() {
    let state = create_app_state(
        Env::Production,
        MockRepository::default(),
        MockIdentityProvider::new(),
    );
    let app = spawn_app(state).await;

    let response = client().get(format!("{}/health", app.address)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn program_catalog_is_served_as_json() {
    let state = create_app_state(
        Env::Production,
        MockRepository::default(),
        MockIdentityProvider::new(),
    );
    let app = spawn_app(state).await;

    let programs: Vec<serde_json::Value> = client()
        .get(format!("{}/api/programs", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(programs.len(), 4);
    let slugs: Vec<&str> = programs.iter().map(|p| p["slug"].as_str().unwrap()).collect();
    assert!(slugs.contains(&"general"));
    assert!(slugs.contains(&"stem"));
}

#[tokio::test]
async fn profile_endpoint_requires_a_session() {
    let (user, token) = seeded_user(Role::Content);
    let state = create_app_state(
        Env::Production,
        MockRepository::with_users(vec![user.clone()]),
        MockIdentityProvider::new(),
    );
    let app = spawn_app(state).await;
    let http = client();

    let response = http.get(format!("{}/api/me", app.address)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let profile: serde_json::Value = http
        .get(format!("{}/api/me", app.address))
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["email"], user.email);
    assert_eq!(profile["role"], "content");
}
