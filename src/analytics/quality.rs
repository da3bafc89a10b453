//! Session quality and progression baseline selection

use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use super::WorkingSetRule;
use super::days::days_descending;
use crate::sets::WorkoutSet;

/// Quality, baseline and targets look at strict working sets only
pub const QUALITY_RULE: WorkingSetRule = WorkingSetRule::ExcludeWarmUpAndBonus;

/// Fewer sets than this and the day says nothing
const MIN_SETS: usize = 2;

/// All-distinct weights below this set count hint at deleted sets
const DISTINCT_WEIGHT_MIN_SETS: usize = 4;

/// Larger rep drop between neighbours hints at a missing set
const MAX_REP_GAP: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionQuality {
    Complete,
    Incomplete,
    Insufficient,
}

impl std::fmt::Display for SessionQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complete => write!(f, "complete"),
            Self::Incomplete => write!(f, "incomplete"),
            Self::Insufficient => write!(f, "insufficient"),
        }
    }
}

/// Classify one day's working sets
pub fn classify(sets: &[&WorkoutSet]) -> SessionQuality {
    if sets.len() < MIN_SETS {
        return SessionQuality::Insufficient;
    }

    if all_weights_distinct(sets) && sets.len() < DISTINCT_WEIGHT_MIN_SETS {
        return SessionQuality::Incomplete;
    }

    let mut reps: Vec<u32> = sets.iter().map(|s| s.reps).collect();
    reps.sort_unstable_by(|a, b| b.cmp(a));
    if reps.windows(2).any(|pair| pair[0] - pair[1] > MAX_REP_GAP) {
        return SessionQuality::Incomplete;
    }

    SessionQuality::Complete
}

fn all_weights_distinct(sets: &[&WorkoutSet]) -> bool {
    let mut weights: Vec<f64> = sets.iter().map(|s| s.weight).collect();
    weights.sort_by(|a, b| a.total_cmp(b));
    weights.windows(2).all(|pair| pair[0] != pair[1])
}

/// Reference day for the next session's targets
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Baseline<'a> {
    /// Most recent complete day
    Reliable {
        date: NaiveDate,
        #[serde(skip)]
        sets: Vec<&'a WorkoutSet>,
    },
    /// No complete day; the most recent day looks incomplete
    Unreliable {
        date: NaiveDate,
        #[serde(skip)]
        sets: Vec<&'a WorkoutSet>,
        warning: String,
    },
    None,
}

impl<'a> Baseline<'a> {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Baseline::Reliable { date, .. } | Baseline::Unreliable { date, .. } => Some(*date),
            Baseline::None => None,
        }
    }

    /// Chronological strict working sets of the baseline day
    pub fn sets(&self) -> &[&'a WorkoutSet] {
        match self {
            Baseline::Reliable { sets, .. } | Baseline::Unreliable { sets, .. } => sets,
            Baseline::None => &[],
        }
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            Baseline::Unreliable { warning, .. } => Some(warning),
            _ => None,
        }
    }

    pub fn is_reliable(&self) -> bool {
        matches!(self, Baseline::Reliable { .. })
    }
}

/// Walk days before `today`, newest first.
///
/// First complete day wins. Without one, only the single most recent day is
/// considered: it is used when incomplete, and when it is insufficient there is
/// no baseline. Older incomplete days behind it are not searched.
pub fn select_baseline<'a>(sets: &'a [WorkoutSet], tz: &FixedOffset, today: NaiveDate) -> Baseline<'a> {
    let strict = sets.iter().filter(|s| QUALITY_RULE.includes(s));
    let days: Vec<_> = days_descending(strict, tz)
        .into_iter()
        .filter(|d| d.date < today)
        .collect();

    if let Some(day) = days
        .iter()
        .find(|d| classify(&d.sets) == SessionQuality::Complete)
    {
        return Baseline::Reliable {
            date: day.date,
            sets: day.sets.clone(),
        };
    }

    match days.into_iter().next() {
        Some(day) if classify(&day.sets) == SessionQuality::Incomplete => Baseline::Unreliable {
            warning: format!(
                "No complete session found; {} looks incomplete, targets may be off",
                day.date
            ),
            date: day.date,
            sets: day.sets,
        },
        _ => Baseline::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sets::NewSet;
    use chrono::{Duration, TimeZone, Utc};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, d).unwrap()
    }

    fn create_day(d: u32, pairs: &[(f64, u32)]) -> Vec<WorkoutSet> {
        let start = Utc.with_ymd_and_hms(2026, 7, d, 18, 0, 0).unwrap();
        pairs
            .iter()
            .enumerate()
            .map(|(i, (w, r))| {
                NewSet::new(*w, *r, start + Duration::minutes(i as i64 * 3))
                    .into_set(1)
                    .unwrap()
            })
            .collect()
    }

    fn quality_of(pairs: &[(f64, u32)]) -> SessionQuality {
        let sets = create_day(1, pairs);
        let refs: Vec<&WorkoutSet> = sets.iter().collect();
        classify(&refs)
    }

    #[test]
    fn test_insufficient_below_two_sets() {
        assert_eq!(quality_of(&[]), SessionQuality::Insufficient);
        assert_eq!(quality_of(&[(60.0, 10)]), SessionQuality::Insufficient);
    }

    #[test]
    fn test_equal_weights_complete() {
        let q = quality_of(&[(40.0, 10), (40.0, 10), (40.0, 10)]);
        assert_eq!(q, SessionQuality::Complete);
    }

    #[test]
    fn test_distinct_weights_few_sets_incomplete() {
        let q = quality_of(&[(40.0, 10), (45.0, 10), (50.0, 10)]);
        assert_eq!(q, SessionQuality::Incomplete);
    }

    #[test]
    fn test_distinct_weights_four_sets_complete() {
        let q = quality_of(&[(40.0, 10), (45.0, 10), (50.0, 9), (55.0, 8)]);
        assert_eq!(q, SessionQuality::Complete);
    }

    #[test]
    fn test_rep_gap_incomplete() {
        let q = quality_of(&[(40.0, 12), (40.0, 10), (40.0, 3)]);
        assert_eq!(q, SessionQuality::Incomplete);
    }

    #[test]
    fn test_rep_gap_of_four_allowed() {
        let q = quality_of(&[(40.0, 12), (40.0, 8), (40.0, 8)]);
        assert_eq!(q, SessionQuality::Complete);
    }

    #[test]
    fn test_rep_gap_checked_after_sorting() {
        // 3, 12, 10 in logging order; sorted 12, 10, 3 has a gap of 7
        let q = quality_of(&[(40.0, 3), (40.0, 12), (40.0, 10)]);
        assert_eq!(q, SessionQuality::Incomplete);
    }

    #[test]
    fn test_baseline_reliable_skips_incomplete_recent_day() {
        let mut sets = create_day(2, &[(40.0, 10), (40.0, 10), (40.0, 10)]);
        sets.extend(create_day(5, &[(40.0, 12), (40.0, 3)]));
        let baseline = select_baseline(&sets, &utc(), day(8));
        assert!(baseline.is_reliable());
        assert_eq!(baseline.date(), Some(day(2)));
        assert_eq!(baseline.sets().len(), 3);
    }

    #[test]
    fn test_baseline_ignores_today() {
        let mut sets = create_day(2, &[(40.0, 10), (45.0, 10)]);
        sets.extend(create_day(8, &[(40.0, 10), (40.0, 10)]));
        let baseline = select_baseline(&sets, &utc(), day(8));
        assert!(!baseline.is_reliable());
        assert_eq!(baseline.date(), Some(day(2)));
    }

    #[test]
    fn test_baseline_unreliable_with_warning() {
        let sets = create_day(5, &[(40.0, 12), (40.0, 3)]);
        let baseline = select_baseline(&sets, &utc(), day(8));
        assert_eq!(baseline.date(), Some(day(5)));
        assert!(baseline.warning().unwrap().contains("incomplete"));
    }

    #[test]
    fn test_baseline_none_when_latest_insufficient() {
        let mut sets = create_day(2, &[(40.0, 12), (40.0, 3)]);
        sets.extend(create_day(5, &[(40.0, 10)]));
        assert_eq!(select_baseline(&sets, &utc(), day(8)), Baseline::None);
    }

    #[test]
    fn test_baseline_none_without_history() {
        assert_eq!(select_baseline(&[], &utc(), day(8)), Baseline::None);
    }

    #[test]
    fn test_baseline_excludes_bonus_sets() {
        let mut sets = create_day(5, &[(40.0, 10), (40.0, 10), (20.0, 30)]);
        sets[2].is_bonus = true;
        let baseline = select_baseline(&sets, &utc(), day(8));
        assert!(baseline.is_reliable());
        assert_eq!(baseline.sets().len(), 2);
    }
}
