//! Domain error types
//!
//! These errors are framework-agnostic and represent business-level failures.
//! The HTTP mapping lives in `api::error`.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Resource not found; carries the resource name
    #[error("{0} not found")]
    NotFound(String),
    /// Invalid input, rejected before any write
    #[error("Validation error: {0}")]
    Validation(String),
    /// Uniqueness or reference conflict
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Missing or bad credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// Authenticated, but the role lacks the capability
    #[error("Forbidden: missing permission {0}")]
    Forbidden(String),
    /// Too many failed logins; a human verification must pass first
    #[error("Human verification required")]
    BotCheckRequired,
    /// Database/persistence error
    #[error("Database error: {0}")]
    Database(String),
    /// Local file storage error
    #[error("Storage error: {0}")]
    Storage(String),
    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(what: &str) -> Self {
        DomainError::NotFound(what.to_string())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }
}

// Conversion from SeaORM errors (used in infrastructure layer)
impl From<DbErr> for DomainError {
    fn from(e: DbErr) -> Self {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => DomainError::Conflict(msg),
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => DomainError::Conflict(msg),
            _ => DomainError::Database(e.to_string()),
        }
    }
}

impl From<std::io::Error> for DomainError {
    fn from(e: std::io::Error) -> Self {
        DomainError::Storage(e.to_string())
    }
}
