/// Storage layer for persisting sleep records
///
/// This module handles all database operations using SQLite. The insight
/// engine only ever reads through `recent_records`; the other operations back
/// the logging tools.

pub mod sqlite;
pub mod migrations;

// Re-export the main storage types
pub use sqlite::*;

use thiserror::Error;
use crate::domain::{DomainError, RecordId, SleepRecord, UserId};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Sleep record not found: {record_id}")]
    RecordNotFound { record_id: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Trait defining the storage interface for sleep records
///
/// This trait keeps the tools and the insight engine independent of SQLite.
pub trait SleepStorage {
    /// Store a new record
    fn create_record(&self, record: &SleepRecord) -> Result<(), StorageError>;

    /// Get a record by ID
    fn get_record(&self, record_id: &RecordId) -> Result<SleepRecord, StorageError>;

    /// Replace an existing record
    fn update_record(&self, record: &SleepRecord) -> Result<(), StorageError>;

    /// Permanently remove a record
    fn delete_record(&self, record_id: &RecordId) -> Result<(), StorageError>;

    /// Fetch at most `limit` records for a user, newest night first
    fn recent_records(&self, user_id: &UserId, limit: u32) -> Result<Vec<SleepRecord>, StorageError>;
}
