use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("verification request {request_id} references missing service log {log_id}")]
    DanglingRequest { request_id: String, log_id: String },

    #[error("verification request {request_id} points at {status} service log {log_id}")]
    AlreadyResolved {
        request_id: String,
        log_id: String,
        status: &'static str,
    },

    #[error("invalid seed data: {0}")]
    Seed(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
