//! Recorded sets - the atomic record of the log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// One recorded set of an exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSet {
    pub id: Option<i64>,
    pub exercise_id: i64,
    pub weight: f64,           // 0 = bodyweight / no load
    pub reps: u32,
    pub timestamp: DateTime<Utc>,
    pub is_warm_up: bool,
    pub is_bonus: bool,
    pub is_drop_set: bool,
    pub is_assisted: bool,
    pub is_pause_at_top: bool,
    pub is_timed_set: bool,
    pub tempo_seconds: Option<u32>,
    /// Personal record holder, maintained by the engine
    pub is_pb: bool,
    /// Rest taken after this set, captured when the next set arrives
    pub rest_seconds: Option<u32>,
}

impl WorkoutSet {
    pub fn has_weight(&self) -> bool {
        self.weight > 0.0
    }

    pub fn has_reps(&self) -> bool {
        self.reps > 0
    }

    /// Volume under the strict accumulator: weight x reps only when both are present
    pub fn volume(&self) -> f64 {
        if self.has_weight() && self.has_reps() {
            self.weight * self.reps as f64
        } else {
            0.0
        }
    }
}

/// Proposed set coming from the recording layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSet {
    pub weight: f64,
    pub reps: u32,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_warm_up: bool,
    #[serde(default)]
    pub is_bonus: bool,
    #[serde(default)]
    pub is_drop_set: bool,
    #[serde(default)]
    pub is_assisted: bool,
    #[serde(default)]
    pub is_pause_at_top: bool,
    /// Some(..) marks the set as timed
    #[serde(default)]
    pub tempo_seconds: Option<u32>,
}

impl NewSet {
    /// Plain working set
    pub fn new(weight: f64, reps: u32, timestamp: DateTime<Utc>) -> Self {
        Self {
            weight,
            reps,
            timestamp,
            is_warm_up: false,
            is_bonus: false,
            is_drop_set: false,
            is_assisted: false,
            is_pause_at_top: false,
            tempo_seconds: None,
        }
    }

    pub fn warm_up(mut self) -> Self {
        self.is_warm_up = true;
        self
    }

    pub fn bonus(mut self) -> Self {
        self.is_bonus = true;
        self
    }

    pub fn timed(mut self, tempo_seconds: u32) -> Self {
        self.tempo_seconds = Some(tempo_seconds);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_load(self.weight, self.reps)?;
        if self.tempo_seconds == Some(0) {
            return Err(ValidationError::MissingTempo);
        }
        Ok(())
    }

    /// Build the record to insert. Derived fields start cleared.
    pub fn into_set(self, exercise_id: i64) -> Result<WorkoutSet, ValidationError> {
        self.validate()?;
        Ok(WorkoutSet {
            id: None,
            exercise_id,
            weight: self.weight,
            reps: self.reps,
            timestamp: self.timestamp,
            is_warm_up: self.is_warm_up,
            is_bonus: self.is_bonus,
            is_drop_set: self.is_drop_set,
            is_assisted: self.is_assisted,
            is_pause_at_top: self.is_pause_at_top,
            is_timed_set: self.tempo_seconds.is_some(),
            tempo_seconds: self.tempo_seconds,
            is_pb: false,
            rest_seconds: None,
        })
    }
}

/// Partial update of a recorded set; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetEdit {
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub is_warm_up: Option<bool>,
    pub is_bonus: Option<bool>,
    pub is_drop_set: Option<bool>,
    pub is_assisted: Option<bool>,
    pub is_pause_at_top: Option<bool>,
    pub is_timed_set: Option<bool>,
    pub tempo_seconds: Option<u32>,
}

impl SetEdit {
    /// Apply to a copy of `set`, validating the merged result
    pub fn apply(&self, set: &WorkoutSet) -> Result<WorkoutSet, ValidationError> {
        let mut updated = set.clone();
        if let Some(weight) = self.weight {
            updated.weight = weight;
        }
        if let Some(reps) = self.reps {
            updated.reps = reps;
        }
        if let Some(v) = self.is_warm_up {
            updated.is_warm_up = v;
        }
        if let Some(v) = self.is_bonus {
            updated.is_bonus = v;
        }
        if let Some(v) = self.is_drop_set {
            updated.is_drop_set = v;
        }
        if let Some(v) = self.is_assisted {
            updated.is_assisted = v;
        }
        if let Some(v) = self.is_pause_at_top {
            updated.is_pause_at_top = v;
        }
        if let Some(tempo) = self.tempo_seconds {
            updated.tempo_seconds = Some(tempo);
            updated.is_timed_set = true;
        }
        if let Some(timed) = self.is_timed_set {
            updated.is_timed_set = timed;
        }

        validate_load(updated.weight, updated.reps)?;
        if updated.is_timed_set {
            match updated.tempo_seconds {
                Some(t) if t > 0 => {}
                _ => return Err(ValidationError::MissingTempo),
            }
        } else {
            updated.tempo_seconds = None;
        }

        Ok(updated)
    }

    /// Whether this edit can move the personal record
    pub fn affects_record(&self) -> bool {
        self.weight.is_some() || self.reps.is_some() || self.is_warm_up.is_some() || self.is_bonus.is_some()
    }
}

/// weight >= 0, reps >= 0 and at least one of them non-zero
pub fn validate_load(weight: f64, reps: u32) -> Result<(), ValidationError> {
    if !weight.is_finite() {
        return Err(ValidationError::NonFiniteWeight);
    }
    if weight < 0.0 {
        return Err(ValidationError::NegativeWeight(weight));
    }
    if weight == 0.0 && reps == 0 {
        return Err(ValidationError::EmptySet);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_set(weight: f64, reps: u32) -> WorkoutSet {
        NewSet::new(weight, reps, Utc::now()).into_set(1).unwrap()
    }

    #[test]
    fn test_validate_rejects_empty_set() {
        let result = NewSet::new(0.0, 0, Utc::now()).validate();
        assert_eq!(result, Err(ValidationError::EmptySet));
    }

    #[test]
    fn test_validate_rejects_negative_weight() {
        let result = NewSet::new(-5.0, 10, Utc::now()).validate();
        assert_eq!(result, Err(ValidationError::NegativeWeight(-5.0)));
    }

    #[test]
    fn test_validate_rejects_nan_weight() {
        let result = NewSet::new(f64::NAN, 10, Utc::now()).validate();
        assert_eq!(result, Err(ValidationError::NonFiniteWeight));
    }

    #[test]
    fn test_validate_accepts_bodyweight_and_weight_only() {
        assert!(NewSet::new(0.0, 12, Utc::now()).validate().is_ok());
        assert!(NewSet::new(100.0, 0, Utc::now()).validate().is_ok());
    }

    #[test]
    fn test_zero_tempo_rejected() {
        let result = NewSet::new(0.0, 1, Utc::now()).timed(0).validate();
        assert_eq!(result, Err(ValidationError::MissingTempo));
    }

    #[test]
    fn test_into_set_marks_timed() {
        let set = NewSet::new(0.0, 1, Utc::now()).timed(45).into_set(3).unwrap();
        assert!(set.is_timed_set);
        assert_eq!(set.tempo_seconds, Some(45));
        assert_eq!(set.exercise_id, 3);
        assert!(!set.is_pb);
        assert!(set.rest_seconds.is_none());
    }

    #[test]
    fn test_volume_needs_weight_and_reps() {
        assert_eq!(create_set(60.0, 10).volume(), 600.0);
        assert_eq!(create_set(0.0, 10).volume(), 0.0);
        assert_eq!(create_set(60.0, 0).volume(), 0.0);
    }

    #[test]
    fn test_edit_keeps_unset_fields() {
        let set = create_set(60.0, 10);
        let edit = SetEdit { reps: Some(12), ..Default::default() };
        let updated = edit.apply(&set).unwrap();
        assert_eq!(updated.weight, 60.0);
        assert_eq!(updated.reps, 12);
    }

    #[test]
    fn test_edit_rejects_zeroing_both() {
        let set = create_set(0.0, 10);
        let edit = SetEdit { reps: Some(0), ..Default::default() };
        assert_eq!(edit.apply(&set), Err(ValidationError::EmptySet));
    }

    #[test]
    fn test_edit_untimed_clears_tempo() {
        let set = NewSet::new(0.0, 1, Utc::now()).timed(30).into_set(1).unwrap();
        let edit = SetEdit { is_timed_set: Some(false), ..Default::default() };
        let updated = edit.apply(&set).unwrap();
        assert!(!updated.is_timed_set);
        assert!(updated.tempo_seconds.is_none());
    }

    #[test]
    fn test_edit_timed_without_tempo_rejected() {
        let set = create_set(20.0, 10);
        let edit = SetEdit { is_timed_set: Some(true), ..Default::default() };
        assert_eq!(edit.apply(&set), Err(ValidationError::MissingTempo));
    }

    #[test]
    fn test_affects_record() {
        assert!(SetEdit { weight: Some(1.0), ..Default::default() }.affects_record());
        assert!(SetEdit { is_bonus: Some(true), ..Default::default() }.affects_record());
        assert!(!SetEdit { is_drop_set: Some(true), ..Default::default() }.affects_record());
    }
}
