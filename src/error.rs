use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::worker::WorkerOperationResponse;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{field} must be a date in YYYY-MM-DD format, got {value:?}")]
    InvalidDate { field: &'static str, value: String },
    #[error("{field} must be a non-negative whole number, got {value:?}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("email {0:?} is not a valid address")]
    InvalidEmail(String),
    #[error("birth_date {0} is after today")]
    FutureBirthDate(String),
}

impl ValidationError {
    /// Name of the offending field, without the submitted value.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Missing(field)
            | ValidationError::InvalidDate { field, .. }
            | ValidationError::InvalidNumber { field, .. }
            | ValidationError::TooLong { field, .. } => *field,
            ValidationError::InvalidEmail(_) => "email",
            ValidationError::FutureBirthDate(_) => "birth_date",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] mongodb::error::Error),
    #[error("{0}")]
    Rejected(String),
}

/// Failure of a register or update operation, as reported to the submitter.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("INVALID_ID")]
    InvalidId(String),
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("worker {0} not found")]
    NotFound(i64),
    #[error("persistence failed: {0}")]
    Persistence(#[from] StoreError),
}

impl ResponseError for WorkerError {
    fn status_code(&self) -> StatusCode {
        match self {
            WorkerError::InvalidId(_) | WorkerError::Validation(_) => StatusCode::BAD_REQUEST,
            WorkerError::NotFound(_) => StatusCode::NOT_FOUND,
            WorkerError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(WorkerOperationResponse::failed(self))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a valid port number, got {value:?}")]
    InvalidPort { key: &'static str, value: String },
    #[error("{key} must be a valid header name, got {value:?}")]
    InvalidHeader { key: &'static str, value: String },
}
