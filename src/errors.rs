use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Error type shared by every service and handler in the crate.
///
/// Each variant maps to a fixed HTTP status and a client-safe message.
/// Database and hashing failures keep their details out of the response
/// body; the logging middleware picks them up through [`ErrorKind`].
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Authentication required")]
    NotAuthenticated,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Resource not found")]
    NotFound,
    #[error("Not enough stock available for {0}")]
    InsufficientStock(String),
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Database error")]
    Database(#[from] DbErr),
    #[error("Failed to hash password")]
    PasswordHash(String),
    #[error("Failed to issue token")]
    Token(String),
}

impl StoreError {
    pub fn status(&self) -> StatusCode {
        match self {
            StoreError::NotAuthenticated | StoreError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            StoreError::NotFound => StatusCode::NOT_FOUND,
            StoreError::InsufficientStock(_) | StoreError::Conflict(_) => StatusCode::CONFLICT,
            StoreError::EmptyCart | StoreError::Validation(_) => StatusCode::BAD_REQUEST,
            StoreError::Config(_)
            | StoreError::Database(_)
            | StoreError::PasswordHash(_)
            | StoreError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::NotAuthenticated => "not_authenticated",
            StoreError::InvalidCredentials => "invalid_credentials",
            StoreError::NotFound => "not_found",
            StoreError::InsufficientStock(_) => "insufficient_stock",
            StoreError::EmptyCart => "empty_cart",
            StoreError::Validation(_) => "validation",
            StoreError::Conflict(_) => "conflict",
            StoreError::Config(_) => "config",
            StoreError::Database(_) => "database",
            StoreError::PasswordHash(_) => "password_hash",
            StoreError::Token(_) => "token",
        }
    }

    /// Message safe to return to the client. Server side failures keep
    /// their internals in the log only.
    fn client_message(&self) -> String {
        match self {
            StoreError::Config(_)
            | StoreError::Database(_)
            | StoreError::PasswordHash(_)
            | StoreError::Token(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

/// Tag attached to error responses so the logging middleware can report
/// what went wrong without re-parsing the body.
#[derive(Clone, Copy, Debug)]
pub struct ErrorKind(pub &'static str);

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            match &self {
                StoreError::Database(err) => error!(error = %err, "database failure"),
                StoreError::Config(msg) => error!(error = %msg, "configuration failure"),
                StoreError::PasswordHash(msg) => error!(error = %msg, "password hashing failure"),
                StoreError::Token(msg) => error!(error = %msg, "token failure"),
                _ => {}
            }
        }
        let body = Json(json!({
            "success": false,
            "message": self.client_message(),
        }));
        let mut response = (status, body).into_response();
        response.extensions_mut().insert(ErrorKind(self.kind()));
        response
    }
}
