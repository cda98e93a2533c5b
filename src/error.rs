//!
//! # Error Handling
//!
//! Two error types live here:
//!
//! * `DomainError` is what repositories and services return. It names business
//!   outcomes (`TaskNotFound`, `UserAlreadyExists`, ...) and wraps the failures
//!   of the collaborators (store, password hasher, token service).
//! * `AppError` is the HTTP-facing error. It implements
//!   `actix_web::error::ResponseError` so handlers and middleware can return it
//!   with `?` and have it rendered as a JSON body with the right status code.
//!
//! Internal failures are logged where they are converted and reach the client
//! only as a generic message.

use actix_web::{error::ResponseError, HttpResponse};
use serde_json::json;
use std::fmt;
use thiserror::Error;
use validator::ValidationErrors;

use crate::auth::token::TokenError;

/// Outcomes of the service and repository layers that are not a success.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid task id")]
    InvalidTaskId,
    #[error("invalid user id")]
    InvalidUserId,
    #[error("due date can not be in the past")]
    InvalidDueDate,
    #[error("invalid status {0:?}: must be one of pending, completed, missed")]
    InvalidStatus(String),
    #[error("task not found")]
    TaskNotFound,
    #[error("user not found")]
    UserNotFound,
    #[error("username already exists")]
    UserAlreadyExists,
    #[error("incorrect password")]
    IncorrectPassword,
    /// The bounded per-call deadline elapsed before the store answered.
    #[error("store call timed out")]
    Timeout,
    #[error("store failure: {0}")]
    Store(String),
    #[error("password hashing failure: {0}")]
    PasswordHash(String),
    #[error("token failure: {0}")]
    Token(#[from] TokenError),
}

/// Represents all possible errors that can leave an HTTP handler or middleware.
///
/// Each variant carries the message that ends up in the `{"error": ...}` body.
#[derive(Debug)]
pub enum AppError {
    /// Missing, invalid or expired credentials (HTTP 401).
    Unauthorized(String),
    /// Authenticated, but lacking the admin privilege (HTTP 403).
    Forbidden(String),
    /// Malformed or semantically invalid request (HTTP 400).
    BadRequest(String),
    /// The requested resource does not exist (HTTP 404).
    NotFound(String),
    /// Unexpected server-side failure (HTTP 500).
    InternalServerError(String),
    /// Request body failed its `validator` rules (HTTP 400).
    ValidationError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Unauthorized(msg) => HttpResponse::Unauthorized().json(json!({
                "error": msg
            })),
            AppError::Forbidden(msg) => HttpResponse::Forbidden().json(json!({
                "error": msg
            })),
            AppError::BadRequest(msg) | AppError::ValidationError(msg) => {
                HttpResponse::BadRequest().json(json!({
                    "error": msg
                }))
            }
            AppError::NotFound(msg) => HttpResponse::NotFound().json(json!({
                "error": msg
            })),
            AppError::InternalServerError(msg) => HttpResponse::InternalServerError().json(json!({
                "error": msg
            })),
        }
    }
}

/// Maps service outcomes onto HTTP errors.
///
/// Client mistakes keep their message. Everything that went wrong on our side
/// is logged here and replaced by a generic message.
impl From<DomainError> for AppError {
    fn from(error: DomainError) -> AppError {
        match error {
            DomainError::InvalidTaskId
            | DomainError::InvalidUserId
            | DomainError::InvalidDueDate
            | DomainError::InvalidStatus(_)
            | DomainError::UserAlreadyExists
            | DomainError::IncorrectPassword => AppError::BadRequest(error.to_string()),
            DomainError::TaskNotFound | DomainError::UserNotFound => {
                AppError::NotFound(error.to_string())
            }
            DomainError::Timeout => {
                log::error!("request deadline exceeded while waiting for the store");
                AppError::InternalServerError("request context expired".into())
            }
            DomainError::Store(msg) => {
                log::error!("store error: {}", msg);
                AppError::InternalServerError("internal server error".into())
            }
            DomainError::PasswordHash(msg) => {
                log::error!("password hashing error: {}", msg);
                AppError::InternalServerError("failed to process credentials".into())
            }
            DomainError::Token(err) => {
                log::error!("token error: {}", err);
                AppError::InternalServerError("unable to generate token".into())
            }
        }
    }
}

/// Request body validation failures keep their field-level details.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

/// A token that fails verification is a client problem.
impl From<TokenError> for AppError {
    fn from(error: TokenError) -> AppError {
        AppError::Unauthorized(error.to_string())
    }
}
