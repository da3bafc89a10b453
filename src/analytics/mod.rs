//! Analytics - read-only views over one exercise's sets
//!
//! Features:
//! - Day grouping in the configured timezone
//! - Session metrics, best day and history
//! - Personal record detection
//! - Progress comparison and progressive-overload targets

pub mod days;
pub mod metrics;
pub mod overload;
pub mod progress;
pub mod quality;
pub mod records;
pub mod sessions;

use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;

use crate::sets::WorkoutSet;

pub use metrics::{ExerciseType, SessionMetrics};
pub use overload::{ProgressionPath, ProgressionTargets, TargetPlan};
pub use progress::{Direction, ProgressComparison};
pub use quality::{Baseline, SessionQuality};
pub use sessions::{BestDay, BestDayCriterion, DaySummary, SessionSummary};

/// Which sets count as working sets for a given view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkingSetRule {
    ExcludeWarmUp,
    ExcludeWarmUpAndBonus,
}

impl WorkingSetRule {
    pub fn includes(&self, set: &WorkoutSet) -> bool {
        match self {
            WorkingSetRule::ExcludeWarmUp => !set.is_warm_up,
            WorkingSetRule::ExcludeWarmUpAndBonus => !set.is_warm_up && !set.is_bonus,
        }
    }
}

pub fn working_sets<'a, I>(sets: I, rule: WorkingSetRule) -> Vec<&'a WorkoutSet>
where
    I: IntoIterator<Item = &'a WorkoutSet>,
{
    sets.into_iter().filter(|s| rule.includes(s)).collect()
}

/// Targets plus the baseline they were built from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextSessionTargets {
    pub baseline_date: NaiveDate,
    pub reliable: bool,
    pub warning: Option<String>,
    #[serde(flatten)]
    pub targets: ProgressionTargets,
}

/// Exercise analytics
pub struct Analytics {
    sets: Vec<WorkoutSet>,
    tz: FixedOffset,
}

impl Analytics {
    pub fn new(sets: Vec<WorkoutSet>, tz: FixedOffset) -> Self {
        Self { sets, tz }
    }

    pub fn sets(&self) -> &[WorkoutSet] {
        &self.sets
    }

    pub fn today(&self, today: NaiveDate) -> SessionSummary {
        sessions::today_session(&self.sets, &self.tz, today)
    }

    pub fn last_session(&self, today: NaiveDate) -> Option<SessionSummary> {
        sessions::last_session(&self.sets, &self.tz, today)
    }

    pub fn metrics_for_day(&self, date: NaiveDate) -> SessionMetrics {
        sessions::metrics_for_day(&self.sets, &self.tz, date)
    }

    pub fn personal_record(&self) -> Option<&WorkoutSet> {
        records::find_personal_record(&self.sets)
    }

    pub fn best_day(&self) -> Option<BestDay> {
        sessions::best_day(&self.sets, &self.tz)
    }

    /// Today against the last session
    pub fn progress(&self, today: NaiveDate) -> ProgressComparison {
        let current = self.today(today);
        let last = self.last_session(today);
        progress::compare(&current.metrics, last.as_ref().map(|l| &l.metrics))
    }

    pub fn baseline(&self, today: NaiveDate) -> Baseline<'_> {
        quality::select_baseline(&self.sets, &self.tz, today)
    }

    pub fn targets(&self, today: NaiveDate) -> Option<NextSessionTargets> {
        let baseline = self.baseline(today);
        let baseline_date = baseline.date()?;
        let targets = overload::generate(baseline.sets())?;

        Some(NextSessionTargets {
            baseline_date,
            reliable: baseline.is_reliable(),
            warning: baseline.warning().map(str::to_string),
            targets,
        })
    }

    pub fn history(&self) -> Vec<DaySummary> {
        sessions::history(&self.sets, &self.tz)
    }
}
