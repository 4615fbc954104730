/// MCP tools for sleep logging and coaching
///
/// This module contains all the MCP tools that external clients (like Claude)
/// can call to record nights and ask for analysis or insights. Each tool takes
/// a typed parameter struct whose JSON schema is published in `tools/list`.

pub mod log;
pub mod list;
pub mod update;
pub mod delete;
pub mod analysis;
pub mod insights;

// Re-export tool functions for easy access
pub use log::*;
pub use list::*;
pub use update::*;
pub use delete::*;
pub use analysis::*;
pub use insights::*;

use chrono::NaiveDate;
use crate::domain::{RecordId, UserId};
use crate::storage::StorageError;

/// Parse a user ID argument
pub(crate) fn parse_user_id(raw: &str) -> Result<UserId, StorageError> {
    Ok(UserId::parse(raw)?)
}

/// Parse a record ID argument
pub(crate) fn parse_record_id(raw: &str) -> Result<RecordId, StorageError> {
    RecordId::from_string(raw.trim())
        .map_err(|_| StorageError::InvalidInput(format!("Invalid record ID format: '{}'", raw)))
}

/// Parse a YYYY-MM-DD date argument
pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, StorageError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| StorageError::InvalidInput(format!("Invalid date '{}', expected YYYY-MM-DD", raw)))
}
