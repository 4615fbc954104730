/// SleepRecord entity for nightly sleep logs
///
/// This module defines the SleepRecord struct that represents one night of
/// sleep for a user: duration, subjective quality, energy through the next day,
/// context tags and an optional note.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use crate::domain::{RecordId, UserId, DomainError};

/// Energy level assumed when the user skipped a rating
pub const DEFAULT_ENERGY: u8 = 3;

/// Tag marking a night without sleep
pub const TAG_ALL_NIGHTER: &str = "All-nighter";

/// Tag marking a night during an exam period
pub const TAG_EXAM_WEEK: &str = "Exam week";

/// A single night of sleep
///
/// Records are immutable as far as the insight engine is concerned. They are
/// handed to it newest-first and it never re-sorts them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepRecord {
    /// Unique identifier for this record
    pub id: RecordId,
    /// Who slept
    pub user_id: UserId,
    /// Which night this record is for
    pub date: NaiveDate,
    /// Hours slept (0-24)
    pub hours: f64,
    /// Subjective quality rating (1-5)
    pub quality: u8,
    /// Energy in the morning after (1-5)
    pub morning_energy: u8,
    /// Energy in the afternoon after (1-5)
    pub afternoon_energy: u8,
    /// Energy in the evening after (1-5)
    pub evening_energy: u8,
    /// Free-form context tags ("All-nighter", "Exam week", "Exercise", ...)
    pub tags: Vec<String>,
    /// User's notes about the night
    pub notes: Option<String>,
    /// When this record was logged
    pub logged_at: DateTime<Utc>,
}

/// Input for creating a record, before validation
#[derive(Debug, Clone, Default)]
pub struct NewSleepRecord {
    pub date: Option<NaiveDate>,
    pub hours: f64,
    pub quality: u8,
    pub morning_energy: Option<u8>,
    pub afternoon_energy: Option<u8>,
    pub evening_energy: Option<u8>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
}

impl SleepRecord {
    /// Create a new sleep record with validation
    ///
    /// Missing energy ratings default to 3 and a missing date defaults to today.
    /// The logged_at timestamp is set to the current time.
    pub fn new(user_id: UserId, input: NewSleepRecord) -> Result<Self, DomainError> {
        let date = input.date.unwrap_or_else(|| Utc::now().naive_utc().date());
        let morning_energy = input.morning_energy.unwrap_or(DEFAULT_ENERGY);
        let afternoon_energy = input.afternoon_energy.unwrap_or(DEFAULT_ENERGY);
        let evening_energy = input.evening_energy.unwrap_or(DEFAULT_ENERGY);
        let tags = Self::normalize_tags(input.tags);

        Self::validate_date(&date)?;
        Self::validate_hours(input.hours)?;
        Self::validate_rating("Quality", input.quality)?;
        Self::validate_rating("Morning energy", morning_energy)?;
        Self::validate_rating("Afternoon energy", afternoon_energy)?;
        Self::validate_rating("Evening energy", evening_energy)?;
        Self::validate_tags(&tags)?;
        Self::validate_notes(&input.notes)?;

        Ok(Self {
            id: RecordId::new(),
            user_id,
            date,
            hours: input.hours,
            quality: input.quality,
            morning_energy,
            afternoon_energy,
            evening_energy,
            tags,
            notes: input.notes,
            logged_at: Utc::now(),
        })
    }

    /// Create a record from existing data (used when loading from database)
    ///
    /// This constructor assumes data is already validated.
    #[allow(clippy::too_many_arguments)]
    pub fn from_existing(
        id: RecordId,
        user_id: UserId,
        date: NaiveDate,
        hours: f64,
        quality: u8,
        energy: [u8; 3],
        tags: Vec<String>,
        notes: Option<String>,
        logged_at: DateTime<Utc>,
    ) -> Self {
        let [morning_energy, afternoon_energy, evening_energy] = energy;
        Self {
            id,
            user_id,
            date,
            hours,
            quality,
            morning_energy,
            afternoon_energy,
            evening_energy,
            tags,
            notes,
            logged_at,
        }
    }

    /// Check whether the record carries a tag (exact match)
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Check if this record has a non-blank note
    pub fn has_notes(&self) -> bool {
        self.notes.as_deref().is_some_and(|n| !n.trim().is_empty())
    }

    /// Replace the tag list, trimming and de-duplicating like `new` does
    pub fn replace_tags(&mut self, tags: Vec<String>) {
        self.tags = Self::normalize_tags(tags);
    }

    /// Re-run every field check, used after applying a partial update
    pub fn revalidate(&self) -> Result<(), DomainError> {
        Self::validate_date(&self.date)?;
        Self::validate_hours(self.hours)?;
        Self::validate_rating("Quality", self.quality)?;
        Self::validate_rating("Morning energy", self.morning_energy)?;
        Self::validate_rating("Afternoon energy", self.afternoon_energy)?;
        Self::validate_rating("Evening energy", self.evening_energy)?;
        Self::validate_tags(&self.tags)?;
        Self::validate_notes(&self.notes)
    }

    // Validation helper methods

    fn normalize_tags(tags: Vec<String>) -> Vec<String> {
        let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
        for tag in tags {
            let trimmed = tag.trim();
            if !trimmed.is_empty() && !normalized.iter().any(|t| t == trimmed) {
                normalized.push(trimmed.to_string());
            }
        }
        normalized
    }

    /// Validate that the date is not in the future
    fn validate_date(date: &NaiveDate) -> Result<(), DomainError> {
        let today = Utc::now().naive_utc().date();

        if *date > today {
            return Err(DomainError::InvalidDate(
                "Cannot log sleep for future dates".to_string()
            ));
        }

        Ok(())
    }

    fn validate_hours(hours: f64) -> Result<(), DomainError> {
        if !hours.is_finite() || !(0.0..=24.0).contains(&hours) {
            return Err(DomainError::InvalidValue {
                message: format!("Hours slept must be between 0 and 24, got {}", hours)
            });
        }
        Ok(())
    }

    /// Validate a 1-5 rating
    fn validate_rating(field: &str, rating: u8) -> Result<(), DomainError> {
        if !(1..=5).contains(&rating) {
            return Err(DomainError::InvalidValue {
                message: format!("{} must be between 1 and 5, got {}", field, rating)
            });
        }
        Ok(())
    }

    fn validate_tags(tags: &[String]) -> Result<(), DomainError> {
        if tags.len() > 10 {
            return Err(DomainError::InvalidValue {
                message: "A record cannot have more than 10 tags".to_string()
            });
        }
        if let Some(tag) = tags.iter().find(|t| t.len() > 40) {
            return Err(DomainError::InvalidValue {
                message: format!("Tag '{}' is longer than 40 characters", tag)
            });
        }
        Ok(())
    }

    /// Validate the optional notes field
    fn validate_notes(notes: &Option<String>) -> Result<(), DomainError> {
        if let Some(note_text) = notes {
            if note_text.len() > 500 {
                return Err(DomainError::InvalidValue {
                    message: "Notes cannot be longer than 500 characters".to_string()
                });
            }
        }
        Ok(())
    }
}
