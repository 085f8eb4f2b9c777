//! Unified error type for the marketplace core and its HTTP surface.
//!
//! Every core operation returns [`Result`]. Variants carry enough context for
//! the HTTP layer to build a useful message without re-querying the store.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Insufficient balance: have {current} cents, need {required} cents")]
    InsufficientBalance { current: i64, required: i64 },

    #[error("Amount {amount} cents is below the minimum of {minimum} cents")]
    BelowMinimum { amount: i64, minimum: i64 },

    #[error("Submission {submission_id} was already reviewed ({status})")]
    AlreadyReviewed { submission_id: i64, status: String },

    #[error("{entity} {id} was already processed")]
    AlreadyProcessed { entity: &'static str, id: i64 },

    #[error("{entity} with {field} '{value}' already exists")]
    AlreadyExists {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Worker {worker_id} already has an open submission for task {task_id}")]
    DuplicateSubmission { task_id: i64, worker_id: i64 },

    #[error("Task {task_id} is not accepting submissions ({status})")]
    TaskNotActive { task_id: i64, status: String },

    #[error("Task {task_id} already reached its quantity of {quantity}")]
    TaskFull { task_id: i64, quantity: i32 },

    #[error("Not authorized: {reason}")]
    Unauthorized { reason: String },

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::Unauthorized`] with the given reason.
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
