//! Error types for the portal.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// PortalError
///
/// The handler-facing error type. Internal detail is logged server-side;
/// clients receive a status code and a generic message so nothing about the
/// database, templates or the identity provider leaks into responses.
#[derive(Error, Debug)]
pub enum PortalError {
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("identity provider error: {0}")]
    Identity(String),

    #[error("identity provider rejected the request: {0}")]
    IdentityRejected(String),

    #[error("session error: {0}")]
    Session(#[from] jsonwebtoken::errors::Error),

    #[error("{0}")]
    NotFound(String),
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            PortalError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found"),
            PortalError::IdentityRejected(_) => (StatusCode::BAD_REQUEST, "Request rejected"),
            PortalError::Identity(_) => (StatusCode::BAD_GATEWAY, "Upstream service unavailable"),
            PortalError::Template(_) | PortalError::Database(_) | PortalError::Session(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        (status, message).into_response()
    }
}

pub type Result<T> = std::result::Result<T, PortalError>;
