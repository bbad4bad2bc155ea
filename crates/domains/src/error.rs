//! # AppError
//!
//! Centralized error taxonomy for the Clubhouse ecosystem. The policy
//! engine and input validation run before any repository mutation, so a
//! rejected request never leaves a partial write behind.

use thiserror::Error;

/// The primary error type for all domain operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// No session, or credentials that do not check out. Unknown username
    /// and wrong password are deliberately indistinguishable.
    #[error("authentication required")]
    Unauthenticated,

    /// The policy engine said DENY.
    #[error("forbidden")]
    Forbidden,

    /// Malformed or missing input, with field-level detail where feasible.
    #[error("validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Resource not found (e.g. user, message, setting key).
    #[error("{0} not found with id {1}")]
    NotFound(&'static str, String),

    /// Unique-constraint violation (e.g. duplicate username).
    #[error("conflict: {message}")]
    Conflict {
        message: String,
        field: Option<String>,
    },

    /// Infrastructure failure. The detail stays in the logs, never in the
    /// response body.
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>, field: Option<&str>) -> Self {
        Self::Validation {
            message: message.into(),
            field: field.map(str::to_string),
        }
    }

    pub fn conflict(message: impl Into<String>, field: Option<&str>) -> Self {
        Self::Conflict {
            message: message.into(),
            field: field.map(str::to_string),
        }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound(entity, id.to_string())
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A specialized Result type for Clubhouse logic.
pub type Result<T> = std::result::Result<T, AppError>;
