/// Analytics engine for sleep analysis and personalized insights
///
/// This module holds the two read paths over a user's nights: the analysis
/// report (pure metrics plus a handful of fixed recommendations) and the
/// insight pipeline (cache, advisor, rule-based fallback) coordinated by the
/// orchestrator.

pub mod advisor;
pub mod cache;
pub mod fallback;
pub mod orchestrator;

pub use advisor::{Advisor, AdvisorError, NullAdvisor, OpenAIAdvisor};
pub use cache::{CacheKey, InMemoryInsightCache, InsightCache};
pub use fallback::FallbackGenerator;
pub use orchestrator::InsightOrchestrator;

use serde::{Deserialize, Serialize};

use crate::analytics::fallback::{CRITICAL_DEBT_HOURS, LOW_CONSISTENCY, MODERATE_DEBT_HOURS};
use crate::analytics::orchestrator::{INSUFFICIENT_DATA_MESSAGE, INSUFFICIENT_DATA_TIP};
use crate::domain::{Chronotype, EventScope, InsightMode, PatternSummary, SleepRecord};

/// Most records the analysis path looks at
pub const ANALYSIS_RECORD_LIMIT: u32 = 30;

/// Message returned by the analysis path for a user with no records
pub const NO_DATA_MESSAGE: &str = "No sleep data available";

/// Generated insight content, shaped by mode
///
/// Serialized untagged: quick tips go over the wire as a JSON array, a
/// detailed narrative as a plain string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InsightPayload {
    QuickTips(Vec<String>),
    DetailedNarrative(String),
}

impl InsightPayload {
    pub fn mode(&self) -> InsightMode {
        match self {
            InsightPayload::QuickTips(_) => InsightMode::Quick,
            InsightPayload::DetailedNarrative(_) => InsightMode::Detailed,
        }
    }

    pub fn as_tips(&self) -> Option<&[String]> {
        match self {
            InsightPayload::QuickTips(tips) => Some(tips),
            InsightPayload::DetailedNarrative(_) => None,
        }
    }

    pub fn as_narrative(&self) -> Option<&str> {
        match self {
            InsightPayload::QuickTips(_) => None,
            InsightPayload::DetailedNarrative(text) => Some(text),
        }
    }

    /// Human-readable text, one tip per line in quick mode
    pub fn render(&self) -> String {
        match self {
            InsightPayload::QuickTips(tips) => tips.join("\n"),
            InsightPayload::DetailedNarrative(text) => text.clone(),
        }
    }
}

/// Where an insight response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightSource {
    Advisor,
    Fallback,
    Cache,
    InsufficientData,
}

impl InsightSource {
    pub fn label(&self) -> &'static str {
        match self {
            InsightSource::Advisor => "advisor",
            InsightSource::Fallback => "fallback",
            InsightSource::Cache => "cache",
            InsightSource::InsufficientData => "insufficient-data",
        }
    }
}

/// Result of an insight request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightResponse {
    pub insights: InsightPayload,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub from_cache: bool,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub requires_more_data: bool,

    /// Only present on freshly computed detailed results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patterns: Option<PatternSummary>,

    #[serde(skip)]
    pub source: InsightSource,
}

impl InsightResponse {
    /// Placeholder response for users with fewer than three nights
    pub fn insufficient_data(mode: InsightMode) -> Self {
        let insights = match mode {
            InsightMode::Quick => InsightPayload::QuickTips(vec![INSUFFICIENT_DATA_TIP.to_string()]),
            InsightMode::Detailed => InsightPayload::DetailedNarrative(INSUFFICIENT_DATA_MESSAGE.to_string()),
        };

        Self {
            insights,
            from_cache: false,
            requires_more_data: true,
            patterns: None,
            source: InsightSource::InsufficientData,
        }
    }

    pub fn cached(insights: InsightPayload) -> Self {
        Self {
            insights,
            from_cache: true,
            requires_more_data: false,
            patterns: None,
            source: InsightSource::Cache,
        }
    }

    /// Freshly computed response; the summary is attached in detailed mode
    pub fn fresh(insights: InsightPayload, source: InsightSource, mode: InsightMode, summary: PatternSummary) -> Self {
        Self {
            insights,
            from_cache: false,
            requires_more_data: false,
            patterns: match mode {
                InsightMode::Detailed => Some(summary),
                InsightMode::Quick => None,
            },
            source,
        }
    }
}

/// Full analysis report for a user with at least one record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepAnalysis {
    #[serde(flatten)]
    pub patterns: PatternSummary,
    pub efficiency: f64,
    pub recommendations: Vec<String>,
}

/// Result of an analysis request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    NoData { message: String },
    Report(SleepAnalysis),
}

/// Analytics engine for the analysis report
///
/// Stateless: no cache, no advisor. Everything is derived from the records
/// passed in.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticsEngine;

impl AnalyticsEngine {
    /// Create a new analytics engine
    pub fn new() -> Self {
        Self
    }

    /// Analyze up to 30 newest-first records
    pub fn analyze(&self, records: &[SleepRecord]) -> AnalysisOutcome {
        let window = records.len().min(ANALYSIS_RECORD_LIMIT as usize);

        match PatternSummary::calculate(&records[..window], EventScope::RecentOnly) {
            None => AnalysisOutcome::NoData {
                message: NO_DATA_MESSAGE.to_string(),
            },
            Some(patterns) => AnalysisOutcome::Report(SleepAnalysis {
                efficiency: patterns.efficiency(),
                recommendations: self.recommendations(&patterns),
                patterns,
            }),
        }
    }

    /// Reduced rule set: debt, consistency, chronotype
    pub fn recommendations(&self, patterns: &PatternSummary) -> Vec<String> {
        let mut recommendations = Vec::new();

        if patterns.sleep_debt > CRITICAL_DEBT_HOURS {
            recommendations.push("Priority: Add 1 hour to your sleep for the next week".to_string());
        } else if patterns.sleep_debt > MODERATE_DEBT_HOURS {
            recommendations.push("Add 30 minutes to your sleep schedule".to_string());
        }

        if patterns.consistency < LOW_CONSISTENCY {
            recommendations.push("Set a fixed bedtime to improve consistency".to_string());
        }

        match patterns.chronotype {
            Chronotype::NightOwl => {
                recommendations.push("Schedule important tasks after 2 PM when you peak".to_string())
            }
            Chronotype::MorningLark => {
                recommendations.push("Use morning hours (9-11 AM) for complex work".to_string())
            }
            Chronotype::Intermediate => {}
        }

        recommendations
    }
}
