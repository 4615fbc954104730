/// Sleep pattern summary and the metrics that produce it
///
/// This module defines the PatternSummary struct that holds the statistics
/// derived from a user's recent nights, and the calculation that builds it from
/// a newest-first slice of sleep records. Everything here is pure: no I/O, no
/// state carried between calls.

use serde::{Deserialize, Serialize};
use crate::domain::{Chronotype, SleepRecord, Trend, TAG_ALL_NIGHTER, TAG_EXAM_WEEK};

/// Nightly duration (hours) that sleep debt is measured against
pub const OPTIMAL_SLEEP_HOURS: f64 = 7.5;

/// Number of nights in the recent (and the older) analysis window
pub const WINDOW_NIGHTS: usize = 7;

/// Minimum gap between morning and evening energy before a chronotype is assigned
const CHRONOTYPE_MARGIN: f64 = 0.5;

/// Minimum change in average hours between windows before a trend is reported
const TREND_MARGIN: f64 = 0.5;

/// Afternoon energy below this average counts as an afternoon crash
const AFTERNOON_CRASH_THRESHOLD: f64 = 2.5;

/// Which records are scanned when counting tagged special events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventScope {
    /// Recent window plus the older window (insight path)
    RecentAndOlder,
    /// Recent window only (analysis path)
    RecentOnly,
}

/// Statistics derived from a user's recent nights
///
/// Recomputed from scratch on every request and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternSummary {
    /// Mean hours slept over the recent window
    pub avg_sleep: f64,
    /// Mean quality rating over the recent window
    pub avg_quality: f64,
    /// Accumulated shortfall against 7.5h over the recent window
    pub sleep_debt: f64,
    /// Night-to-night regularity (0-100)
    pub consistency: f64,
    pub chronotype: Chronotype,
    /// Stable when there is no older window to compare against
    pub trend: Trend,
    /// Records tagged "All-nighter" in the event scope
    pub all_nighters: u32,
    /// Records tagged "Exam week" in the event scope
    pub exam_weeks: u32,
    /// Mean afternoon energy below 2.5
    pub afternoon_crash: bool,
    /// How many nights the recent window held
    pub nights_analyzed: u32,
}

impl PatternSummary {
    /// Calculate a pattern summary from records sorted newest-first
    ///
    /// The first seven records form the recent window; the next (up to) seven
    /// form the older window used only for the trend. Returns None for an empty
    /// slice so callers have to handle the no-data case explicitly.
    pub fn calculate(records: &[SleepRecord], scope: EventScope) -> Option<Self> {
        if records.is_empty() {
            return None;
        }

        let recent_len = records.len().min(WINDOW_NIGHTS);
        let recent = &records[..recent_len];
        let older_end = records.len().min(WINDOW_NIGHTS * 2);
        let older = &records[recent_len..older_end];

        let avg_sleep = mean(recent.iter().map(|r| r.hours));
        let avg_quality = mean(recent.iter().map(|r| f64::from(r.quality)));
        let sleep_debt = Self::calculate_sleep_debt(recent);
        let consistency = Self::calculate_consistency(recent, avg_sleep);
        let chronotype = Self::detect_chronotype(recent);
        let trend = Self::detect_trend(avg_sleep, older);

        let event_window = match scope {
            EventScope::RecentAndOlder => &records[..older_end],
            EventScope::RecentOnly => recent,
        };
        let all_nighters = count_tagged(event_window, TAG_ALL_NIGHTER);
        let exam_weeks = count_tagged(event_window, TAG_EXAM_WEEK);

        let avg_afternoon = mean(recent.iter().map(|r| f64::from(r.afternoon_energy)));

        Some(Self {
            avg_sleep,
            avg_quality,
            sleep_debt,
            consistency,
            chronotype,
            trend,
            all_nighters,
            exam_weeks,
            afternoon_crash: avg_afternoon < AFTERNOON_CRASH_THRESHOLD,
            nights_analyzed: recent_len as u32,
        })
    }

    /// Blend of quality and duration used by the analysis report (0-100)
    ///
    /// Quality contributes up to 60 points, duration relative to 7.5h up to 40;
    /// oversleeping can push the raw value past 100 so it is capped.
    pub fn efficiency(&self) -> f64 {
        ((self.avg_quality / 5.0) * 60.0 + (self.avg_sleep / OPTIMAL_SLEEP_HOURS) * 40.0).min(100.0)
    }

    // Private helper methods

    /// Hours short of the optimum, summed and rounded to the 0.1h hours are logged at
    fn calculate_sleep_debt(recent: &[SleepRecord]) -> f64 {
        let debt: f64 = recent
            .iter()
            .map(|r| (OPTIMAL_SLEEP_HOURS - r.hours).max(0.0))
            .sum();
        (debt * 10.0).round() / 10.0
    }

    /// 100 minus twenty points per hour of population standard deviation, floored at 0
    fn calculate_consistency(recent: &[SleepRecord], avg_sleep: f64) -> f64 {
        let variance = mean(recent.iter().map(|r| (r.hours - avg_sleep).powi(2)));
        (100.0 - variance.sqrt() * 20.0).max(0.0)
    }

    fn detect_chronotype(recent: &[SleepRecord]) -> Chronotype {
        let morning = mean(recent.iter().map(|r| f64::from(r.morning_energy)));
        let evening = mean(recent.iter().map(|r| f64::from(r.evening_energy)));

        if morning > evening + CHRONOTYPE_MARGIN {
            Chronotype::MorningLark
        } else if evening > morning + CHRONOTYPE_MARGIN {
            Chronotype::NightOwl
        } else {
            Chronotype::Intermediate
        }
    }

    fn detect_trend(avg_sleep: f64, older: &[SleepRecord]) -> Trend {
        if older.is_empty() {
            return Trend::Stable;
        }

        let older_avg = mean(older.iter().map(|r| r.hours));
        if avg_sleep > older_avg + TREND_MARGIN {
            Trend::Improving
        } else if avg_sleep < older_avg - TREND_MARGIN {
            Trend::Declining
        } else {
            Trend::Stable
        }
    }
}

/// Arithmetic mean; 0.0 for an empty iterator
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn count_tagged(records: &[SleepRecord], tag: &str) -> u32 {
    records.iter().filter(|r| r.has_tag(tag)).count() as u32
}
