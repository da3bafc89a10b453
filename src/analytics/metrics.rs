//! Single-pass session metrics

use serde::{Deserialize, Serialize};

use crate::sets::WorkoutSet;

/// Kind of load an exercise is logged with, inferred from its working sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    /// Weight logged, no reps (holds, carries)
    WeightOnly,
    /// Reps logged, no weight (bodyweight)
    RepsOnly,
    /// Both, and the default when nothing is known
    Combined,
}

impl std::fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WeightOnly => write!(f, "weight_only"),
            Self::RepsOnly => write!(f, "reps_only"),
            Self::Combined => write!(f, "combined"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub exercise_type: ExerciseType,
    /// Sum of weight x reps over sets that have both
    pub volume: f64,
    pub max_weight: f64,
    /// Best reps at `max_weight`
    pub max_weight_reps: u32,
    pub set_count: usize,
    /// Widened so long bodyweight sessions cannot overflow
    pub total_reps: u64,
}

impl SessionMetrics {
    pub fn empty() -> Self {
        Self {
            exercise_type: ExerciseType::Combined,
            volume: 0.0,
            max_weight: 0.0,
            max_weight_reps: 0,
            set_count: 0,
            total_reps: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.set_count == 0
    }

    pub fn average_reps(&self) -> f64 {
        if self.set_count == 0 {
            0.0
        } else {
            self.total_reps as f64 / self.set_count as f64
        }
    }
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::empty()
    }
}

/// Compute metrics over `sets` in one pass.
///
/// Volume, maxima and counts cover every set passed in; the caller decides
/// which sets belong. The exercise type looks only at non-warm-up sets.
pub fn metrics<'a, I>(sets: I) -> SessionMetrics
where
    I: IntoIterator<Item = &'a WorkoutSet>,
{
    let mut result = SessionMetrics::empty();
    let mut any_weight = false;
    let mut any_reps = false;

    for set in sets {
        result.set_count += 1;
        result.total_reps += u64::from(set.reps);
        result.volume += set.volume();

        if set.weight > result.max_weight {
            result.max_weight = set.weight;
            result.max_weight_reps = set.reps;
        } else if set.weight == result.max_weight && set.reps > result.max_weight_reps {
            result.max_weight_reps = set.reps;
        }

        if !set.is_warm_up {
            any_weight |= set.has_weight();
            any_reps |= set.has_reps();
        }
    }

    result.exercise_type = infer_type(any_weight, any_reps);
    result
}

/// Exercise type from the presence of weight and reps in working sets
pub fn infer_type(any_weight: bool, any_reps: bool) -> ExerciseType {
    match (any_weight, any_reps) {
        (true, false) => ExerciseType::WeightOnly,
        (false, true) => ExerciseType::RepsOnly,
        _ => ExerciseType::Combined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sets::NewSet;
    use chrono::{Duration, TimeZone, Utc};

    fn create_sets(pairs: &[(f64, u32)]) -> Vec<WorkoutSet> {
        let start = Utc.with_ymd_and_hms(2026, 4, 1, 17, 0, 0).unwrap();
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

    #[test]
    fn test_metrics_empty() {
        let sets: Vec<WorkoutSet> = vec![];
        let m = metrics(&sets);
        assert_eq!(m, SessionMetrics::empty());
        assert_eq!(m.exercise_type, ExerciseType::Combined);
        assert!(m.is_empty());
    }

    #[test]
    fn test_metrics_combined() {
        let sets = create_sets(&[(60.0, 10), (60.0, 12), (65.0, 8)]);
        let m = metrics(&sets);
        assert_eq!(m.exercise_type, ExerciseType::Combined);
        assert_eq!(m.volume, 600.0 + 720.0 + 520.0);
        assert_eq!(m.max_weight, 65.0);
        assert_eq!(m.max_weight_reps, 8);
        assert_eq!(m.set_count, 3);
        assert_eq!(m.total_reps, 30);
    }

    #[test]
    fn test_max_weight_reps_is_reps_at_max_weight() {
        let sets = create_sets(&[(80.0, 3), (60.0, 15), (80.0, 5)]);
        let m = metrics(&sets);
        assert_eq!(m.max_weight, 80.0);
        assert_eq!(m.max_weight_reps, 5);
    }

    #[test]
    fn test_total_reps_past_u32_range() {
        let sets = create_sets(&[(0.0, 3_000_000_000), (0.0, 3_000_000_000)]);
        let m = metrics(&sets);
        assert_eq!(m.total_reps, 6_000_000_000);
        assert_eq!(m.max_weight_reps, 3_000_000_000);
        assert_eq!(m.average_reps(), 3_000_000_000.0);
    }

    #[test]
    fn test_bodyweight_is_reps_only() {
        let sets = create_sets(&[(0.0, 8), (0.0, 12)]);
        let m = metrics(&sets);
        assert_eq!(m.exercise_type, ExerciseType::RepsOnly);
        assert_eq!(m.volume, 0.0);
        assert_eq!(m.max_weight, 0.0);
        assert_eq!(m.max_weight_reps, 12);
    }

    #[test]
    fn test_weight_only_contributes_no_volume() {
        let sets = create_sets(&[(100.0, 0), (120.0, 0)]);
        let m = metrics(&sets);
        assert_eq!(m.exercise_type, ExerciseType::WeightOnly);
        assert_eq!(m.volume, 0.0);
        assert_eq!(m.max_weight, 120.0);
    }

    #[test]
    fn test_mixed_weight_only_and_reps_only_is_combined() {
        let sets = create_sets(&[(100.0, 0), (0.0, 10)]);
        assert_eq!(metrics(&sets).exercise_type, ExerciseType::Combined);
        assert_eq!(metrics(&sets).volume, 0.0);
    }

    #[test]
    fn test_warm_ups_ignored_for_type() {
        let mut sets = create_sets(&[(20.0, 10), (0.0, 10)]);
        sets[0].is_warm_up = true;
        assert_eq!(metrics(&sets).exercise_type, ExerciseType::RepsOnly);
    }

    #[test]
    fn test_type_independent_of_order() {
        let sets = create_sets(&[(100.0, 0), (0.0, 10), (50.0, 5)]);
        let mut reversed = sets.clone();
        reversed.reverse();
        assert_eq!(metrics(&sets).exercise_type, metrics(&reversed).exercise_type);
        assert_eq!(metrics(&sets).volume, metrics(&reversed).volume);
    }

    #[test]
    fn test_volume_additive_over_partition() {
        let sets = create_sets(&[(60.0, 10), (0.0, 10), (70.0, 0), (62.5, 8), (40.0, 12)]);
        let (a, b) = sets.split_at(2);
        let whole = metrics(&sets).volume;
        assert_eq!(whole, metrics(a).volume + metrics(b).volume);
        assert!(whole >= 0.0);
    }

    #[test]
    fn test_average_reps() {
        let sets = create_sets(&[(20.0, 10), (20.0, 8)]);
        assert_eq!(metrics(&sets).average_reps(), 9.0);
        assert_eq!(SessionMetrics::empty().average_reps(), 0.0);
    }

    #[test]
    fn test_exercise_type_display() {
        assert_eq!(ExerciseType::WeightOnly.to_string(), "weight_only");
        assert_eq!(ExerciseType::Combined.to_string(), "combined");
    }
}
