/// Basic unit tests to verify core functionality through the public API
use rest_cycle_mcp::analytics::fallback::FallbackGenerator;
use rest_cycle_mcp::*;
use tempfile::NamedTempFile;
use tokio_test::{assert_err, assert_ok};

#[cfg(test)]
mod basic_unit_tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn user() -> UserId {
        UserId::parse("student-42").unwrap()
    }

    /// Newest-first records, one per night ending today
    fn nights(hours: &[f64], energy: (u8, u8, u8)) -> Vec<SleepRecord> {
        let today = Utc::now().naive_utc().date();
        hours
            .iter()
            .enumerate()
            .map(|(i, h)| {
                SleepRecord::new(user(), NewSleepRecord {
                    date: Some(today - Duration::days(i as i64)),
                    hours: *h,
                    quality: 4,
                    morning_energy: Some(energy.0),
                    afternoon_energy: Some(energy.1),
                    evening_energy: Some(energy.2),
                    ..Default::default()
                })
                .unwrap()
            })
            .collect()
    }

    fn summary_with(debt: f64, chronotype: Chronotype, consistency: f64, trend: Trend, crash: bool) -> PatternSummary {
        PatternSummary {
            avg_sleep: 7.0,
            avg_quality: 3.5,
            sleep_debt: debt,
            consistency,
            chronotype,
            trend,
            all_nighters: 0,
            exam_weeks: 0,
            afternoon_crash: crash,
            nights_analyzed: 7,
        }
    }

    #[test]
    fn test_record_validation() {
        let ok = SleepRecord::new(user(), NewSleepRecord { hours: 7.5, quality: 4, ..Default::default() });
        assert_ok!(&ok);

        let future = SleepRecord::new(user(), NewSleepRecord {
            date: Some(Utc::now().naive_utc().date() + Duration::days(2)),
            hours: 7.0,
            quality: 3,
            ..Default::default()
        });
        assert_err!(future);

        let nan = SleepRecord::new(user(), NewSleepRecord { hours: f64::NAN, quality: 3, ..Default::default() });
        assert_err!(nan);
    }

    #[test]
    fn test_steady_eight_hours_scenario() {
        let records = nights(&[8.0, 8.0, 8.0], (3, 3, 3));
        let summary = PatternSummary::calculate(&records, EventScope::RecentAndOlder).unwrap();

        assert!((summary.avg_sleep - 8.0).abs() < 1e-9);
        assert_eq!(summary.sleep_debt, 0.0);
        assert!((summary.consistency - 100.0).abs() < 1e-9);
        assert_eq!(summary.chronotype, Chronotype::Intermediate);
        assert_eq!(summary.trend, Trend::Stable);
    }

    #[test]
    fn test_consistency_and_debt_bounds() {
        let samples: [&[f64]; 5] = [
            &[0.0, 24.0, 0.0, 24.0],
            &[7.5],
            &[3.0, 9.0, 5.5, 6.0, 12.0, 1.0, 8.0],
            &[10.0, 10.0, 10.0],
            &[0.0, 0.0],
        ];

        for hours in samples {
            let summary = PatternSummary::calculate(&nights(hours, (3, 3, 3)), EventScope::RecentOnly).unwrap();
            assert!((0.0..=100.0).contains(&summary.consistency), "consistency out of range for {:?}", hours);
            assert!(summary.sleep_debt >= 0.0, "negative debt for {:?}", hours);
        }
    }

    #[test]
    fn test_swapping_energy_flips_chronotype() {
        let lark = PatternSummary::calculate(&nights(&[7.0, 7.0, 7.0], (5, 3, 2)), EventScope::RecentOnly).unwrap();
        let owl = PatternSummary::calculate(&nights(&[7.0, 7.0, 7.0], (2, 3, 5)), EventScope::RecentOnly).unwrap();
        let close = PatternSummary::calculate(&nights(&[7.0, 7.0], (3, 3, 3)), EventScope::RecentOnly).unwrap();

        assert_eq!(lark.chronotype, Chronotype::MorningLark);
        assert_eq!(owl.chronotype, Chronotype::NightOwl);
        assert_eq!(close.chronotype, Chronotype::Intermediate);
    }

    #[test]
    fn test_moderate_debt_tip_scenario() {
        let records = nights(&[4.0, 5.0, 6.0], (3, 3, 3));
        let summary = PatternSummary::calculate(&records, EventScope::RecentAndOlder).unwrap();
        assert!((summary.sleep_debt - 7.5).abs() < 1e-9);

        let generator = FallbackGenerator::new();
        let tips = generator.quick_tips(&summary);

        assert_eq!(tips.len(), 3);
        assert!(generator.matched_rules(&summary).contains(&"moderate_debt"));
        assert!(tips.iter().any(|t| t.contains("add 30min")));
    }

    #[test]
    fn test_quick_tips_always_three() {
        let generator = FallbackGenerator::new();
        let cases = [
            // no rule matches
            summary_with(0.0, Chronotype::Intermediate, 95.0, Trend::Stable, false),
            // one match
            summary_with(0.0, Chronotype::NightOwl, 95.0, Trend::Stable, false),
            // two matches
            summary_with(6.0, Chronotype::MorningLark, 95.0, Trend::Stable, false),
            // five matches
            summary_with(12.0, Chronotype::NightOwl, 40.0, Trend::Declining, true),
        ];

        for summary in &cases {
            assert_eq!(generator.quick_tips(summary).len(), 3, "{:?}", summary);
        }

        let five = generator.quick_tips(&cases[3]);
        assert!(five[0].contains("Critical"));
    }

    #[test]
    fn test_analysis_engine_no_data() {
        match AnalyticsEngine::new().analyze(&[]) {
            AnalysisOutcome::NoData { message } => assert_eq!(message, "No sleep data available"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_creation() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let server = RestCycleServer::with_advisor(
            temp_file.path().to_path_buf(),
            ServerSettings::default(),
            std::sync::Arc::new(analytics::NullAdvisor),
        );
        assert_ok!(server);
    }

    #[test]
    fn test_storage_creation() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let storage = SqliteStorage::new(temp_file.path().to_path_buf());
        assert_ok!(&storage);

        let storage = storage.unwrap();
        let records = storage.recent_records(&user(), 14).unwrap();
        assert!(records.is_empty());
    }
}
