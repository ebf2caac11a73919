use thiserror::Error;

use crate::models::job::JobStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("route lookup failed: {0}")]
    Lookup(String),

    #[error("booking submission rejected: {0}")]
    Submission(String),

    #[error("entered amount does not match the estimated cost")]
    AmountMismatch,

    #[error("job already claimed: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("booking already submitted")]
    AlreadyBooked,

    #[error("invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Internal(format!("http transport error: {err}"))
    }
}
