/// Domain module containing core business logic and data types
///
/// This module defines the core entities (SleepRecord, PatternSummary) and their
/// validation rules, along with the pure metrics that turn a user's nights into
/// a pattern summary.

pub mod record;
pub mod pattern;
pub mod types;

// Re-export public types for easy access
pub use record::*;
pub use pattern::*;
pub use types::*;

use thiserror::Error;

/// Errors that can occur during domain operations
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid user ID: {0}")]
    InvalidUserId(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid value: {message}")]
    InvalidValue { message: String },
}
