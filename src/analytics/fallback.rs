/// Rule-based insight generation
///
/// Used whenever the external advisor is unconfigured or fails. Quick mode walks
/// a fixed, ordered table of rules and keeps one tip per matching rule; detailed
/// mode composes a narrative from clauses selected by the same summary fields.
/// Output depends on nothing but the summary.

use crate::analytics::InsightPayload;
use crate::domain::{Chronotype, InsightMode, PatternSummary, Trend, OPTIMAL_SLEEP_HOURS};

/// Number of tips returned in quick mode
pub const QUICK_TIP_COUNT: usize = 3;

/// Debt above this many hours is critical
pub const CRITICAL_DEBT_HOURS: f64 = 10.0;

/// Debt above this many hours (and not critical) is moderate
pub const MODERATE_DEBT_HOURS: f64 = 5.0;

/// Consistency below this score earns the fixed-bedtime tip
pub const LOW_CONSISTENCY: f64 = 60.0;

/// Debt above this many hours is described as significant in the narrative
const HEAVY_DEBT_HOURS: f64 = 7.0;

/// Consistency below this score is called out in the narrative
const NARRATIVE_CONSISTENCY: f64 = 70.0;

/// One entry of the quick-mode rule table
pub struct TipRule {
    /// Stable identifier, handy for logging and tests
    pub name: &'static str,
    pub applies: fn(&PatternSummary) -> bool,
    pub tip: fn(&PatternSummary) -> String,
}

/// Quick-mode rules in priority order
///
/// Pairs that share a topic (critical/moderate debt, owl/lark, improving/declining)
/// have mutually exclusive predicates, so at most one of each pair fires.
pub const QUICK_TIP_RULES: [TipRule; 8] = [
    TipRule { name: "critical_debt", applies: has_critical_debt, tip: critical_debt_tip },
    TipRule { name: "moderate_debt", applies: has_moderate_debt, tip: moderate_debt_tip },
    TipRule { name: "night_owl", applies: is_night_owl, tip: night_owl_tip },
    TipRule { name: "morning_lark", applies: is_morning_lark, tip: morning_lark_tip },
    TipRule { name: "afternoon_crash", applies: has_afternoon_crash, tip: afternoon_crash_tip },
    TipRule { name: "low_consistency", applies: has_low_consistency, tip: low_consistency_tip },
    TipRule { name: "improving", applies: is_improving, tip: improving_tip },
    TipRule { name: "declining", applies: is_declining, tip: declining_tip },
];

/// Generic tips used to pad quick mode up to three entries, in order
pub const GENERIC_TIPS: [fn(&PatternSummary) -> String; QUICK_TIP_COUNT] =
    [bedtime_tip, hours_target_tip, screen_time_tip];

fn has_critical_debt(s: &PatternSummary) -> bool {
    s.sleep_debt > CRITICAL_DEBT_HOURS
}

fn has_moderate_debt(s: &PatternSummary) -> bool {
    s.sleep_debt > MODERATE_DEBT_HOURS && s.sleep_debt <= CRITICAL_DEBT_HOURS
}

fn is_night_owl(s: &PatternSummary) -> bool {
    s.chronotype == Chronotype::NightOwl
}

fn is_morning_lark(s: &PatternSummary) -> bool {
    s.chronotype == Chronotype::MorningLark
}

fn has_afternoon_crash(s: &PatternSummary) -> bool {
    s.afternoon_crash
}

fn has_low_consistency(s: &PatternSummary) -> bool {
    s.consistency < LOW_CONSISTENCY
}

fn is_improving(s: &PatternSummary) -> bool {
    s.trend == Trend::Improving
}

fn is_declining(s: &PatternSummary) -> bool {
    s.trend == Trend::Declining
}

fn critical_debt_tip(s: &PatternSummary) -> String {
    format!("🚨 Critical: Add 1 hour nightly to reduce {:.1}h debt", s.sleep_debt)
}

fn moderate_debt_tip(s: &PatternSummary) -> String {
    format!("📊 Sleep debt {:.1}h - add 30min to bedtime", s.sleep_debt)
}

fn night_owl_tip(_: &PatternSummary) -> String {
    "🦉 Night owl: Schedule important work after 2 PM".to_string()
}

fn morning_lark_tip(_: &PatternSummary) -> String {
    "🌅 Morning lark: Use 9-11 AM for complex tasks".to_string()
}

fn afternoon_crash_tip(_: &PatternSummary) -> String {
    "⚡ Combat 2 PM crash with 20-minute power nap".to_string()
}

fn low_consistency_tip(_: &PatternSummary) -> String {
    "⏰ Set fixed bedtime - your sleep varies too much".to_string()
}

fn improving_tip(_: &PatternSummary) -> String {
    "📈 Great progress! Sleep improved vs last week".to_string()
}

fn declining_tip(_: &PatternSummary) -> String {
    "📉 Sleep declining - check stress and screen time".to_string()
}

fn bedtime_tip(s: &PatternSummary) -> String {
    let bedtime = if s.chronotype == Chronotype::NightOwl { "11:30 PM" } else { "10:30 PM" };
    format!("💡 Your optimal bedtime: {}", bedtime)
}

fn hours_target_tip(s: &PatternSummary) -> String {
    let target = if s.avg_sleep < 7.0 { "7-8" } else { "7.5-8.5" };
    format!("💤 Aim for {} hours consistently", target)
}

fn screen_time_tip(_: &PatternSummary) -> String {
    "📱 No screens 30min before bed for better quality".to_string()
}

/// Deterministic insight generator used when no advisor answer is available
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackGenerator;

impl FallbackGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Produce the payload for a mode: three tips or a narrative
    pub fn generate(&self, summary: &PatternSummary, mode: InsightMode) -> InsightPayload {
        match mode {
            InsightMode::Quick => InsightPayload::QuickTips(self.quick_tips(summary)),
            InsightMode::Detailed => InsightPayload::DetailedNarrative(self.detailed_narrative(summary)),
        }
    }

    /// Names of the rules that match, in evaluation order
    pub fn matched_rules(&self, summary: &PatternSummary) -> Vec<&'static str> {
        QUICK_TIP_RULES
            .iter()
            .filter(|rule| (rule.applies)(summary))
            .map(|rule| rule.name)
            .collect()
    }

    /// Exactly three tips: matched rules first, generic tips to fill
    ///
    /// When k rules match (k < 3) the generic tips at positions k..3 are used,
    /// so the padding never repeats a slot the rules already filled.
    pub fn quick_tips(&self, summary: &PatternSummary) -> Vec<String> {
        let mut tips: Vec<String> = QUICK_TIP_RULES
            .iter()
            .filter(|rule| (rule.applies)(summary))
            .map(|rule| (rule.tip)(summary))
            .collect();

        while tips.len() < QUICK_TIP_COUNT {
            let generic = GENERIC_TIPS[tips.len()];
            tips.push(generic(summary));
        }

        tips.truncate(QUICK_TIP_COUNT);
        tips
    }

    /// A few sentences of coaching composed from the summary
    pub fn detailed_narrative(&self, summary: &PatternSummary) -> String {
        let mut overview = format!(
            "Based on your {} chronotype and current patterns, you're averaging {:.1} hours of sleep with a quality score of {:.1}/5.",
            summary.chronotype, summary.avg_sleep, summary.avg_quality
        );
        match summary.trend {
            Trend::Improving => overview.push_str(" That's up from the week before, so whatever you changed is working."),
            Trend::Declining => overview.push_str(" That's down from the week before, which is worth catching early."),
            Trend::Stable => {}
        }

        let mut debt = if summary.sleep_debt > 0.0 {
            let severity = if summary.sleep_debt > HEAVY_DEBT_HOURS {
                "significantly impacting"
            } else {
                "moderately affecting"
            };
            format!(
                "Your sleep debt of {:.1} hours is {} your cognitive performance and energy levels.",
                summary.sleep_debt, severity
            )
        } else {
            "You're carrying no sleep debt this week, which keeps your focus and mood on solid ground.".to_string()
        };
        if summary.afternoon_crash {
            debt.push_str(" The consistent afternoon energy crashes you experience are directly related to how much sleep you're getting.");
        }
        if summary.all_nighters > 0 {
            debt.push_str(&format!(
                " The {} all-nighter{} in your recent history add to that deficit; recovery takes several nights of full sleep, not one long lie-in.",
                summary.all_nighters,
                if summary.all_nighters == 1 { "" } else { "s" }
            ));
        }
        if summary.exam_weeks > 0 {
            debt.push_str(" Exam periods squeeze sleep first, so protect at least 7 hours even on the heaviest study nights.");
        }

        let mut plan = "To optimize your sleep, focus on consistency first. ".to_string();
        plan.push_str(match summary.chronotype {
            Chronotype::NightOwl => "As a night owl, work with your natural rhythm by scheduling demanding tasks for late afternoon and evening when you peak.",
            Chronotype::MorningLark => "As a morning lark, protect your morning hours for your most important work.",
            Chronotype::Intermediate => "Your energy is fairly even across the day, so anchor your hardest work to whenever your schedule is most predictable.",
        });
        if summary.avg_sleep < OPTIMAL_SLEEP_HOURS {
            plan.push_str(" Gradually shift your bedtime by 15 minutes earlier each night until you consistently get 7.5-8 hours.");
        } else {
            plan.push_str(" Keep your current bedtime steady to hold on to the 7.5-8 hours you're already getting.");
        }
        if summary.consistency < NARRATIVE_CONSISTENCY {
            plan.push_str(" Your sleep varies significantly, which disrupts your circadian rhythm. A fixed bedtime, even on weekends, will improve both quality and energy.");
        } else {
            plan.push_str(" Maintain your current consistency for continued benefits.");
        }

        format!("{}\n\n{}\n\n{}", overview, debt, plan)
    }
}
