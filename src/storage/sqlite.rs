/// SQLite implementation of the sleep record storage interface
///
/// This module provides the concrete SQLite implementation for storing
/// and retrieving sleep records. It handles all SQL queries and data conversion.

use std::path::PathBuf;
use rusqlite::{Connection, Row, params};
use chrono::NaiveDate;

use crate::domain::{RecordId, SleepRecord, UserId};
use crate::storage::{StorageError, SleepStorage, migrations};

const RECORD_COLUMNS: &str = "id, user_id, date, hours, quality, morning_energy, afternoon_energy, \
                              evening_energy, tags, notes, logged_at";

/// SQLite-based storage implementation
///
/// This struct holds a connection to the SQLite database and implements
/// all the storage operations defined in the SleepStorage trait.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    ///
    /// This opens the database file and runs any necessary migrations
    /// to ensure the schema is up to date.
    pub fn new(db_path: PathBuf) -> Result<Self, StorageError> {
        let conn = Connection::open(&db_path)
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;

        migrations::initialize_database(&conn)?;

        tracing::info!("SQLite storage initialized at: {:?}", db_path);

        Ok(Self { conn })
    }

    /// Create an in-memory database, mostly useful in tests
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("Failed to open in-memory database: {}", e)))?;

        migrations::initialize_database(&conn)?;

        Ok(Self { conn })
    }

    /// Convert one result row into a SleepRecord
    ///
    /// Columns must be selected in RECORD_COLUMNS order.
    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<SleepRecord> {
        let id_str: String = row.get(0)?;
        let id = RecordId::from_string(&id_str).map_err(|_| {
            rusqlite::Error::InvalidColumnType(0, "Invalid UUID".to_string(), rusqlite::types::Type::Text)
        })?;

        let user_str: String = row.get(1)?;
        let user_id = UserId::parse(&user_str).map_err(|_| {
            rusqlite::Error::InvalidColumnType(1, "Invalid user ID".to_string(), rusqlite::types::Type::Text)
        })?;

        let date_str: String = row.get(2)?;
        let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|_| {
            rusqlite::Error::InvalidColumnType(2, "Invalid date".to_string(), rusqlite::types::Type::Text)
        })?;

        let tags_json: String = row.get(8)?;
        let tags: Vec<String> = serde_json::from_str(&tags_json).map_err(|_| {
            rusqlite::Error::InvalidColumnType(8, "Invalid tags".to_string(), rusqlite::types::Type::Text)
        })?;

        let logged_at_str: String = row.get(10)?;
        let logged_at = chrono::DateTime::parse_from_rfc3339(&logged_at_str)
            .map_err(|_| {
                rusqlite::Error::InvalidColumnType(10, "Invalid datetime".to_string(), rusqlite::types::Type::Text)
            })?
            .with_timezone(&chrono::Utc);

        Ok(SleepRecord::from_existing(
            id,
            user_id,
            date,
            row.get(3)?, // hours
            row.get(4)?, // quality
            [row.get(5)?, row.get(6)?, row.get(7)?],
            tags,
            row.get(9)?, // notes
            logged_at,
        ))
    }
}

impl SleepStorage for SqliteStorage {
    fn create_record(&self, record: &SleepRecord) -> Result<(), StorageError> {
        let tags_json = serde_json::to_string(&record.tags)?;

        self.conn.execute(
            "INSERT INTO sleep_records (
                id, user_id, date, hours, quality, morning_energy, afternoon_energy,
                evening_energy, tags, notes, logged_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                record.id.to_string(),
                record.user_id.as_str(),
                record.date.to_string(),
                record.hours,
                record.quality,
                record.morning_energy,
                record.afternoon_energy,
                record.evening_energy,
                tags_json,
                record.notes,
                record.logged_at.to_rfc3339(),
            ],
        )?;

        tracing::debug!("Created sleep record {} for user {}", record.id.to_string(), record.user_id);
        Ok(())
    }

    fn get_record(&self, record_id: &RecordId) -> Result<SleepRecord, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM sleep_records WHERE id = ?1",
            RECORD_COLUMNS
        ))?;

        match stmt.query_row(params![record_id.to_string()], Self::row_to_record) {
            Ok(record) => Ok(record),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(StorageError::RecordNotFound {
                record_id: record_id.to_string(),
            }),
            Err(e) => Err(StorageError::Query(e)),
        }
    }

    fn update_record(&self, record: &SleepRecord) -> Result<(), StorageError> {
        let tags_json = serde_json::to_string(&record.tags)?;

        let rows_affected = self.conn.execute(
            "UPDATE sleep_records SET
                date = ?2,
                hours = ?3,
                quality = ?4,
                morning_energy = ?5,
                afternoon_energy = ?6,
                evening_energy = ?7,
                tags = ?8,
                notes = ?9
             WHERE id = ?1",
            params![
                record.id.to_string(),
                record.date.to_string(),
                record.hours,
                record.quality,
                record.morning_energy,
                record.afternoon_energy,
                record.evening_energy,
                tags_json,
                record.notes,
            ],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::RecordNotFound {
                record_id: record.id.to_string(),
            });
        }

        tracing::debug!("Updated sleep record {}", record.id.to_string());
        Ok(())
    }

    fn delete_record(&self, record_id: &RecordId) -> Result<(), StorageError> {
        let rows_affected = self.conn.execute(
            "DELETE FROM sleep_records WHERE id = ?1",
            params![record_id.to_string()],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::RecordNotFound {
                record_id: record_id.to_string(),
            });
        }

        tracing::debug!("Deleted sleep record {}", record_id.to_string());
        Ok(())
    }

    fn recent_records(&self, user_id: &UserId, limit: u32) -> Result<Vec<SleepRecord>, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM sleep_records WHERE user_id = ?1
             ORDER BY date DESC, logged_at DESC LIMIT ?2",
            RECORD_COLUMNS
        ))?;

        let record_iter = stmt.query_map(params![user_id.as_str(), limit], Self::row_to_record)?;

        let mut records = Vec::new();
        for record in record_iter {
            records.push(record?);
        }

        Ok(records)
    }
}
