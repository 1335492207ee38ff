use axum::{Router, extract::FromRef, http::HeaderName, middleware};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod flash;
pub mod guard;
pub mod handlers;
pub mod identity;
pub mod layout;
pub mod markdown;
pub mod models;
pub mod programs;
pub mod repository;
pub mod templates;

// Module for routing segregation (Public, Applicant, Staff, Admin).
pub mod routes;
use routes::{admin, applicant, public, staff};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point.
pub use config::AppConfig;
pub use identity::{HostedIdentityClient, IdentityState, MockIdentityProvider};
pub use repository::{PostgresRepository, RepositoryState};
pub use templates::TemplateState;

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation for the portal's JSON API subset
/// (the HTML pages are not part of the API surface). Served at
/// `/api-docs/openapi.json` and browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::api_programs, handlers::api_me, handlers::api_admin_stats),
    components(schemas(
        programs::Program,
        models::UserProfile,
        models::AdmissionStats,
        models::Role,
    )),
    tags(
        (name = "admission-portal", description = "School Admission Portal API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Implements the **Unified State Pattern**: the single, thread-safe, immutable
/// container holding all essential application services and configuration,
/// shared across all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// Repository layer: abstracts database access via the PgPool connection.
    pub repo: RepositoryState,
    /// Identity layer: abstracts the hosted identity provider (signup/login).
    pub identity: IdentityState,
    /// Template environment for server-rendered pages.
    pub templates: TemplateState,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These allow extractors to selectively pull components from the shared
// AppState, which keeps the auth extractor usable against any state that can
// produce a repository and a config.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for IdentityState {
    fn from_ref(app_state: &AppState) -> IdentityState {
        app_state.identity.clone()
    }
}

impl FromRef<AppState> for TemplateState {
    fn from_ref(app_state: &AppState) -> TemplateState {
        app_state.templates.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and
/// scoped middleware, and registers the application state.
///
/// Each guarded tier gets its own `route_layer` so the guard runs only for the
/// routes that exist in that tier — a request for an unknown path 404s instead
/// of bouncing through a login redirect.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public routes: no guard applied.
        .merge(public::public_routes())
        // Applicant tier.
        .merge(
            applicant::applicant_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                guard::applicant_guard,
            )),
        )
        // Staff tiers, each with its own allowed-role set.
        .merge(
            staff::helpdesk_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                guard::helpdesk_guard,
            )),
        )
        .merge(
            staff::content_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                guard::content_guard,
            )),
        )
        // Admin tier.
        .merge(
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                guard::admin_guard,
            )),
        )
        // Apply the unified state to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (applied outermost)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID generation: a unique UUID for every request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request tracing: wraps the request/response lifecycle in a
                // span carrying the generated request id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID propagation back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS layer.
        .layer(cors)
}

/// trace_span_logger
///
/// Customizes the tracing span creation for `TraceLayer`: the `x-request-id`
/// header (if present) is included in the structured logging metadata next to
/// the method and URI, so every log line of a request is correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
