/// Core types and enums used throughout the domain layer
///
/// This module defines the identifier types and the small classification enums
/// (chronotype, trend, insight mode) shared by records, summaries and tools.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

/// Unique identifier for a sleep record
///
/// This is a wrapper around UUID to provide type safety - you can't accidentally
/// pass a record ID where a user ID is expected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub Uuid);

impl RecordId {
    /// Generate a new random record ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a record ID from a string (useful for database loading)
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Convert to string representation
    pub fn to_string(&self) -> String {
        self.0.to_string()
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier of the user who owns a set of sleep records
///
/// Users are not managed by this service; the identifier is whatever the
/// client sends, trimmed and bounded so it can safely be used as a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Parse and validate a user identifier
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(DomainError::InvalidUserId(
                "User ID cannot be empty".to_string()
            ));
        }

        if trimmed.len() > 64 {
            return Err(DomainError::InvalidUserId(
                "User ID cannot be longer than 64 characters".to_string()
            ));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coarse classification of when during the day a sleeper has the most energy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Chronotype {
    /// Morning energy clearly higher than evening energy
    MorningLark,
    /// Evening energy clearly higher than morning energy
    NightOwl,
    /// No clear peak
    Intermediate,
}

impl Chronotype {
    /// Human readable label used in prompts and tips
    pub fn label(&self) -> &'static str {
        match self {
            Chronotype::MorningLark => "morning lark",
            Chronotype::NightOwl => "night owl",
            Chronotype::Intermediate => "intermediate",
        }
    }
}

impl std::fmt::Display for Chronotype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Direction of average sleep duration compared with the previous week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

impl Trend {
    pub fn label(&self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Declining => "declining",
            Trend::Stable => "stable",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Fidelity of a generated insight
///
/// Quick mode produces a short list of tips, detailed mode a narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightMode {
    #[default]
    Quick,
    Detailed,
}

impl InsightMode {
    /// Map the boolean `quick_mode` flag clients send onto a mode
    pub fn from_quick_flag(quick_mode: bool) -> Self {
        if quick_mode {
            InsightMode::Quick
        } else {
            InsightMode::Detailed
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InsightMode::Quick => "quick",
            InsightMode::Detailed => "detailed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_is_trimmed() {
        let user = UserId::parse("  student-42 ").unwrap();
        assert_eq!(user.as_str(), "student-42");
    }

    #[test]
    fn test_user_id_rejects_blank_and_long() {
        assert!(UserId::parse("   ").is_err());
        assert!(UserId::parse(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_mode_from_flag() {
        assert_eq!(InsightMode::from_quick_flag(true), InsightMode::Quick);
        assert_eq!(InsightMode::from_quick_flag(false), InsightMode::Detailed);
        assert_eq!(InsightMode::default(), InsightMode::Quick);
    }

    #[test]
    fn test_chronotype_wire_names() {
        assert_eq!(serde_json::to_string(&Chronotype::NightOwl).unwrap(), "\"night-owl\"");
        assert_eq!(Chronotype::MorningLark.label(), "morning lark");
    }
}
