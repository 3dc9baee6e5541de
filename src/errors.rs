use argon2::password_hash::Error as ArError;
use axum::{http::StatusCode, response::IntoResponse};
use jsonwebtoken::errors::Error as JWError;
use surrealdb::Error as SError;

use thiserror::Error;
use tracing::error;

pub type Result<T> = core::result::Result<T, Error>;

/// Every error raised by the core is final and user-facing. This impl is the
/// single place errors become status codes; storage and library failures are
/// logged and collapsed to an opaque 500.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Argon 2 Error: {0}")]
    Argon2Error(#[from] ArError),

    #[error("Json web token Error: {0}")]
    JwtError(#[from] JWError),

    #[error("SurrealDb Error: {0}")]
    SurrealError(#[from] SError),

    #[error("Io Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Axum Error: {0}")]
    AxumError(#[from] axum::Error),

    #[error("Validator Error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Json Rejection Error: {0}")]
    AxumJsonRejection(#[from] axum::extract::rejection::JsonRejection),

    // ! Core taxonomy
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidOperation(String),

    // ! Auth boundary
    #[error("Invalid login details")]
    InvalidLoginDetails,

    #[error("Email is not verified")]
    EmailNotVerified,

    #[error("User with email `{0}` already exists!")]
    EmailExist(String),

    #[error("Missing authorization token")]
    MissingToken,
    #[error("Invalid authorization token")]
    InvalidToken,
    #[error("Invalid authorization scheme")]
    InvalidScheme,
    #[error("Token expired")]
    TokenExpired,
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            Error::Argon2Error(e) => internal("Argon2", &e),
            Error::JwtError(e) => internal("JWT", &e),
            Error::SurrealError(e) => internal("Surreal", &e),
            Error::IoError(e) => internal("Io", &e),
            Error::AxumError(e) => internal("Axum", &e),
            Error::ValidationError(e) => {
                let message = format!("Input validation error: [{}]", e).replace('\n', ", ");
                (StatusCode::BAD_REQUEST, message)
            }
            Error::AxumJsonRejection(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            Error::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            Error::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            Error::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Error::InvalidOperation(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::InvalidLoginDetails => {
                (StatusCode::BAD_REQUEST, "Invalid login details".to_string())
            }
            Error::EmailNotVerified => (
                StatusCode::FORBIDDEN,
                "Please verify your email first".to_string(),
            ),
            Error::EmailExist(email) => (
                StatusCode::CONFLICT,
                format!("User with email {} already exists!", email),
            ),
            Error::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "Missing authorization token".to_string(),
            ),
            Error::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Invalid authorization token".to_string(),
            ),
            Error::InvalidScheme => (
                StatusCode::UNAUTHORIZED,
                "Invalid authorization scheme".to_string(),
            ),
            Error::TokenExpired => (StatusCode::UNAUTHORIZED, "Token expired".to_string()),
        };
        (status, message).into_response()
    }
}

fn internal(name: &str, err: &dyn std::fmt::Debug) -> (StatusCode, String) {
    error!("{name} Error: {err:#?}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Error".to_string(),
    )
}
