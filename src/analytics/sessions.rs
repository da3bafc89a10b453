//! Session views: today, last completed session, best day ever, history

use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use super::WorkingSetRule;
use super::days::{days_descending, group_by_day, sets_on};
use super::metrics::{SessionMetrics, metrics};
use super::quality::{QUALITY_RULE, SessionQuality, classify};
use crate::sets::WorkoutSet;

/// Today / last session views count bonus sets as real work
pub const SESSION_RULE: WorkingSetRule = WorkingSetRule::ExcludeWarmUp;

/// Best day agrees with the record population
pub const BEST_DAY_RULE: WorkingSetRule = WorkingSetRule::ExcludeWarmUpAndBonus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub date: NaiveDate,
    pub metrics: SessionMetrics,
}

/// Metrics of the session-rule working sets logged on `date`
pub fn metrics_for_day(sets: &[WorkoutSet], tz: &FixedOffset, date: NaiveDate) -> SessionMetrics {
    let day = sets_on(sets, tz, date);
    metrics(day.into_iter().filter(|s| SESSION_RULE.includes(s)))
}

/// Live view of today; empty metrics when nothing is logged yet
pub fn today_session(sets: &[WorkoutSet], tz: &FixedOffset, today: NaiveDate) -> SessionSummary {
    SessionSummary {
        date: today,
        metrics: metrics_for_day(sets, tz, today),
    }
}

/// Most recent day strictly before `today` with at least one working set
pub fn last_session(sets: &[WorkoutSet], tz: &FixedOffset, today: NaiveDate) -> Option<SessionSummary> {
    let working = sets.iter().filter(|s| SESSION_RULE.includes(s));
    group_by_day(working, tz)
        .into_iter()
        .rev()
        .find(|(date, day)| *date < today && !day.is_empty())
        .map(|(date, day)| SessionSummary {
            date,
            metrics: metrics(day),
        })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BestDayCriterion {
    /// Among days holding the heaviest single set, the biggest day volume
    HeaviestSetThenVolume { max_weight: f64 },
    /// Bodyweight: the day with the most total reps
    TotalReps,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestDay {
    pub date: NaiveDate,
    pub metrics: SessionMetrics,
    pub criterion: BestDayCriterion,
}

/// Best day ever. Ties go to the earlier day.
pub fn best_day(sets: &[WorkoutSet], tz: &FixedOffset) -> Option<BestDay> {
    let working: Vec<&WorkoutSet> = sets.iter().filter(|s| BEST_DAY_RULE.includes(s)).collect();
    if working.is_empty() {
        return None;
    }

    let by_day = group_by_day(working.iter().copied(), tz);
    let weighted = working.iter().any(|s| s.has_weight());

    let mut best: Option<(NaiveDate, SessionMetrics)> = None;

    if weighted {
        let max_weight = working
            .iter()
            .map(|s| s.weight)
            .max_by(|a, b| a.total_cmp(b))
            .unwrap_or(0.0);

        for (date, day) in &by_day {
            if !day.iter().any(|s| s.weight == max_weight) {
                continue;
            }
            let day_metrics = metrics(day.iter().copied());
            let better = match &best {
                Some((_, current)) => day_metrics.volume > current.volume,
                None => true,
            };
            if better {
                best = Some((*date, day_metrics));
            }
        }

        best.map(|(date, metrics)| BestDay {
            date,
            metrics,
            criterion: BestDayCriterion::HeaviestSetThenVolume { max_weight },
        })
    } else {
        for (date, day) in &by_day {
            let day_metrics = metrics(day.iter().copied());
            let better = match &best {
                Some((_, current)) => day_metrics.total_reps > current.total_reps,
                None => true,
            };
            if better {
                best = Some((*date, day_metrics));
            }
        }

        best.map(|(date, metrics)| BestDay {
            date,
            metrics,
            criterion: BestDayCriterion::TotalReps,
        })
    }
}

/// One row of the exercise history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub metrics: SessionMetrics,
    pub quality: SessionQuality,
    /// Warm-ups included
    pub logged_sets: usize,
    pub warm_up_sets: usize,
    pub holds_record: bool,
}

/// Full history, newest day first
pub fn history(sets: &[WorkoutSet], tz: &FixedOffset) -> Vec<DaySummary> {
    days_descending(sets, tz)
        .into_iter()
        .map(|day| {
            let session: Vec<&WorkoutSet> = day
                .sets
                .iter()
                .copied()
                .filter(|s| SESSION_RULE.includes(s))
                .collect();
            let strict: Vec<&WorkoutSet> = day
                .sets
                .iter()
                .copied()
                .filter(|s| QUALITY_RULE.includes(s))
                .collect();

            DaySummary {
                date: day.date,
                metrics: metrics(session),
                quality: classify(&strict),
                logged_sets: day.sets.len(),
                warm_up_sets: day.sets.iter().filter(|s| s.is_warm_up).count(),
                holds_record: day.sets.iter().any(|s| s.is_pb),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::metrics::ExerciseType;
    use crate::sets::NewSet;
    use chrono::{Duration, TimeZone, Utc};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, d).unwrap()
    }

    fn create_set(d: u32, minute: i64, weight: f64, reps: u32) -> WorkoutSet {
        let ts = Utc.with_ymd_and_hms(2026, 6, d, 18, 0, 0).unwrap() + Duration::minutes(minute);
        NewSet::new(weight, reps, ts).into_set(1).unwrap()
    }

    #[test]
    fn test_today_session_empty() {
        let summary = today_session(&[], &utc(), day(10));
        assert!(summary.metrics.is_empty());
        assert_eq!(summary.date, day(10));
    }

    #[test]
    fn test_today_session_live() {
        let sets = vec![create_set(10, 0, 50.0, 10), create_set(10, 3, 55.0, 8), create_set(9, 0, 80.0, 5)];
        let summary = today_session(&sets, &utc(), day(10));
        assert_eq!(summary.metrics.set_count, 2);
        assert_eq!(summary.metrics.volume, 500.0 + 440.0);
    }

    #[test]
    fn test_today_session_skips_warm_up_keeps_bonus() {
        let mut sets = vec![create_set(10, 0, 20.0, 10), create_set(10, 3, 50.0, 10), create_set(10, 6, 30.0, 15)];
        sets[0].is_warm_up = true;
        sets[2].is_bonus = true;
        let summary = today_session(&sets, &utc(), day(10));
        assert_eq!(summary.metrics.set_count, 2);
        assert_eq!(summary.metrics.volume, 500.0 + 450.0);
    }

    #[test]
    fn test_last_session_strictly_before_today() {
        let sets = vec![
            create_set(5, 0, 60.0, 10),
            create_set(8, 0, 62.5, 10),
            create_set(10, 0, 65.0, 10),
        ];
        let last = last_session(&sets, &utc(), day(10)).unwrap();
        assert_eq!(last.date, day(8));
        assert_eq!(last.metrics.max_weight, 62.5);
    }

    #[test]
    fn test_last_session_skips_warm_up_only_day() {
        let mut sets = vec![create_set(5, 0, 60.0, 10), create_set(8, 0, 20.0, 10)];
        sets[1].is_warm_up = true;
        let last = last_session(&sets, &utc(), day(10)).unwrap();
        assert_eq!(last.date, day(5));
    }

    #[test]
    fn test_last_session_none_on_first_day() {
        let sets = vec![create_set(10, 0, 60.0, 10)];
        assert!(last_session(&sets, &utc(), day(10)).is_none());
    }

    #[test]
    fn test_best_day_prefers_heaviest_set_over_volume() {
        // Day 1 has the most volume but day 2 holds the heaviest set
        let sets = vec![
            create_set(1, 0, 60.0, 12),
            create_set(1, 3, 60.0, 12),
            create_set(1, 6, 60.0, 12),
            create_set(2, 0, 80.0, 2),
        ];
        let best = best_day(&sets, &utc()).unwrap();
        assert_eq!(best.date, day(2));
        assert_eq!(best.criterion, BestDayCriterion::HeaviestSetThenVolume { max_weight: 80.0 });
    }

    #[test]
    fn test_best_day_ranks_heaviest_days_by_volume() {
        let sets = vec![
            create_set(1, 0, 80.0, 2),
            create_set(2, 0, 80.0, 2),
            create_set(2, 3, 70.0, 5),
            create_set(3, 0, 50.0, 20),
        ];
        let best = best_day(&sets, &utc()).unwrap();
        assert_eq!(best.date, day(2));
        assert_eq!(best.metrics.volume, 160.0 + 350.0);
    }

    #[test]
    fn test_best_day_tie_goes_to_earlier_day() {
        let sets = vec![create_set(1, 0, 80.0, 2), create_set(4, 0, 80.0, 2)];
        assert_eq!(best_day(&sets, &utc()).unwrap().date, day(1));
    }

    #[test]
    fn test_best_day_bodyweight_total_reps() {
        let sets = vec![
            create_set(1, 0, 0.0, 20),
            create_set(2, 0, 0.0, 12),
            create_set(2, 3, 0.0, 12),
        ];
        let best = best_day(&sets, &utc()).unwrap();
        assert_eq!(best.date, day(2));
        assert_eq!(best.criterion, BestDayCriterion::TotalReps);
        assert_eq!(best.metrics.exercise_type, ExerciseType::RepsOnly);
    }

    #[test]
    fn test_best_day_ignores_bonus_sets() {
        let mut sets = vec![create_set(1, 0, 60.0, 5), create_set(2, 0, 100.0, 1)];
        sets[1].is_bonus = true;
        assert_eq!(best_day(&sets, &utc()).unwrap().date, day(1));
    }

    #[test]
    fn test_best_day_none_without_working_sets() {
        let mut sets = vec![create_set(1, 0, 60.0, 5)];
        sets[0].is_warm_up = true;
        assert!(best_day(&sets, &utc()).is_none());
    }

    #[test]
    fn test_history_rows() {
        let mut sets = vec![
            create_set(1, 0, 20.0, 10),
            create_set(1, 3, 60.0, 10),
            create_set(1, 6, 60.0, 10),
            create_set(3, 0, 65.0, 8),
        ];
        sets[0].is_warm_up = true;
        sets[3].is_pb = true;

        let rows = history(&sets, &utc());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, day(3));
        assert!(rows[0].holds_record);
        assert_eq!(rows[0].quality, SessionQuality::Insufficient);
        assert_eq!(rows[1].logged_sets, 3);
        assert_eq!(rows[1].warm_up_sets, 1);
        assert_eq!(rows[1].metrics.set_count, 2);
        assert_eq!(rows[1].quality, SessionQuality::Complete);
    }
}
