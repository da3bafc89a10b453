//! Engine - every mutation of the log goes through here
//!
//! Each operation validates its input, performs its store writes, keeps the
//! personal record flag and rest times consistent, then commits. Any failure
//! rolls the store back to the last commit.

pub mod rest;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analytics::Analytics;
use crate::analytics::records::{self, RecordChange};
use crate::db::{SetStore, SortOrder};
use crate::error::{EngineError, EngineResult, ValidationError};
use crate::exercises::{Exercise, NewExercise, normalize_tags};
use crate::sets::{NewSet, SetEdit, WorkoutSet};

use rest::{MAX_REST_SECONDS, rest_between};

/// Told when a newly logged set takes the personal record
pub trait PrObserver {
    fn on_personal_record(&self, exercise: &Exercise, set: &WorkoutSet);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOutcome {
    pub set: WorkoutSet,
    pub pr_achieved: bool,
}

pub struct Engine<S: SetStore> {
    store: S,
    tz: FixedOffset,
    observers: Vec<Box<dyn PrObserver>>,
}

impl<S: SetStore> Engine<S> {
    pub fn new(store: S, tz: FixedOffset) -> Self {
        Self {
            store,
            tz,
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn PrObserver>) {
        self.observers.push(observer);
    }

    pub fn timezone(&self) -> FixedOffset {
        self.tz
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    // ========== Exercises ==========

    pub fn create_exercise(&mut self, exercise: NewExercise) -> EngineResult<Exercise> {
        let exercise = exercise.normalized()?;
        if self.store.find_exercise_by_name(&exercise.name)?.is_some() {
            return Err(EngineError::DuplicateExercise(exercise.name));
        }

        let created = self.commit("create_exercise", move |store| {
            let id = store.insert_exercise(&exercise)?;
            Ok(exercise.into_exercise(id))
        })?;
        info!("Created exercise {} (id: {})", created.name, created.id);
        Ok(created)
    }

    pub fn exercise(&self, exercise_id: i64) -> EngineResult<Exercise> {
        self.store
            .fetch_exercise(exercise_id)?
            .ok_or(EngineError::ExerciseNotFound(exercise_id))
    }

    pub fn find_exercise(&self, name: &str) -> EngineResult<Option<Exercise>> {
        Ok(self.store.find_exercise_by_name(name)?)
    }

    pub fn exercises(&self) -> EngineResult<Vec<Exercise>> {
        Ok(self.store.list_exercises()?)
    }

    pub fn rename_exercise(&mut self, exercise_id: i64, name: &str) -> EngineResult<Exercise> {
        let mut exercise = self.exercise(exercise_id)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyExerciseName.into());
        }
        if let Some(other) = self.store.find_exercise_by_name(name)?
            && other.id != exercise_id
        {
            return Err(EngineError::DuplicateExercise(name.to_string()));
        }

        exercise.name = name.to_string();
        self.update_exercise(exercise)
    }

    pub fn tag_exercise<I, T>(&mut self, exercise_id: i64, tags: I) -> EngineResult<Exercise>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut exercise = self.exercise(exercise_id)?;
        exercise.tags.extend(normalize_tags(tags));
        self.update_exercise(exercise)
    }

    pub fn untag_exercise<I, T>(&mut self, exercise_id: i64, tags: I) -> EngineResult<Exercise>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut exercise = self.exercise(exercise_id)?;
        for tag in normalize_tags(tags) {
            exercise.tags.remove(&tag);
        }
        self.update_exercise(exercise)
    }

    pub fn set_exercise_note(&mut self, exercise_id: i64, note: Option<&str>) -> EngineResult<Exercise> {
        let mut exercise = self.exercise(exercise_id)?;
        exercise.note = note.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string);
        self.update_exercise(exercise)
    }

    fn update_exercise(&mut self, exercise: Exercise) -> EngineResult<Exercise> {
        self.commit("update_exercise", move |store| {
            store.update_exercise(&exercise)?;
            Ok(exercise)
        })
    }

    /// Removes the exercise and every set logged for it
    pub fn delete_exercise(&mut self, exercise_id: i64) -> EngineResult<Exercise> {
        let exercise = self.exercise(exercise_id)?;
        self.commit("delete_exercise", |store| {
            store.delete_exercise(exercise_id)?;
            Ok(())
        })?;
        info!("Deleted exercise {} (id: {})", exercise.name, exercise.id);
        Ok(exercise)
    }

    // ========== Sets ==========

    pub fn sets(&self, exercise_id: i64) -> EngineResult<Vec<WorkoutSet>> {
        self.exercise(exercise_id)?;
        Ok(self.store.fetch_sets(exercise_id, SortOrder::Ascending)?)
    }

    pub fn set(&self, set_id: i64) -> EngineResult<WorkoutSet> {
        self.store
            .fetch_set(set_id)?
            .ok_or(EngineError::SetNotFound(set_id))
    }

    /// Log a set: capture rest on the preceding set, insert, recompute the record
    pub fn add_set(&mut self, exercise_id: i64, new: NewSet) -> EngineResult<AddOutcome> {
        let exercise = self.exercise(exercise_id)?;
        let mut set = new.into_set(exercise_id)?;

        let existing = self.store.fetch_sets(exercise_id, SortOrder::Ascending)?;
        if existing.iter().any(|s| s.timestamp == set.timestamp) {
            return Err(ValidationError::DuplicateTimestamp {
                exercise_id,
                timestamp: set.timestamp,
            }
            .into());
        }

        let outcome = self.commit("add_set", move |store| {
            if let Some(mut prev) = store.fetch_most_recent_set_before(exercise_id, set.timestamp)? {
                let rest = rest_between(prev.timestamp, set.timestamp);
                prev.rest_seconds = Some(rest);
                store.update(&prev)?;
                debug!(set_id = ?prev.id, rest, "Captured rest time");
            }

            let id = store.insert(&set)?;
            set.id = Some(id);

            let change = recompute_record(store, exercise_id)?;
            let pr_achieved = change.current == Some(id);
            set.is_pb = pr_achieved;

            Ok(AddOutcome { set, pr_achieved })
        })?;

        if outcome.pr_achieved {
            info!(
                "New personal record on {}: {} x {}",
                exercise.name, outcome.set.weight, outcome.set.reps
            );
            for observer in &self.observers {
                observer.on_personal_record(&exercise, &outcome.set);
            }
        }

        Ok(outcome)
    }

    /// Apply a partial edit. Record changes caused by edits are not signalled.
    pub fn edit_set(&mut self, set_id: i64, edit: &SetEdit) -> EngineResult<WorkoutSet> {
        let current = self.set(set_id)?;
        let updated = edit.apply(&current)?;
        if updated == current {
            return Ok(current);
        }

        let needs_recompute = edit.affects_record();
        self.commit("edit_set", move |store| {
            store.update(&updated)?;
            if needs_recompute {
                recompute_record(store, updated.exercise_id)?;
            }
            store
                .fetch_set(set_id)?
                .ok_or(EngineError::SetNotFound(set_id))
        })
    }

    pub fn toggle_warm_up(&mut self, set_id: i64) -> EngineResult<WorkoutSet> {
        let current = self.set(set_id)?;
        let edit = SetEdit {
            is_warm_up: Some(!current.is_warm_up),
            ..Default::default()
        };
        self.edit_set(set_id, &edit)
    }

    pub fn toggle_bonus(&mut self, set_id: i64) -> EngineResult<WorkoutSet> {
        let current = self.set(set_id)?;
        let edit = SetEdit {
            is_bonus: Some(!current.is_bonus),
            ..Default::default()
        };
        self.edit_set(set_id, &edit)
    }

    /// Delete a set. The record is recomputed only if this set held it.
    pub fn delete_set(&mut self, set_id: i64) -> EngineResult<WorkoutSet> {
        let set = self.set(set_id)?;
        let held_record = set.is_pb;
        let exercise_id = set.exercise_id;

        self.commit("delete_set", move |store| {
            store.delete(set_id)?;
            if held_record {
                recompute_record(store, exercise_id)?;
            }
            Ok(())
        })?;
        Ok(set)
    }

    /// Rest timer ran out before another set was logged
    pub fn expire_rest_timer(&mut self, set_id: i64) -> EngineResult<WorkoutSet> {
        let mut set = self.set(set_id)?;
        if self
            .store
            .fetch_next_set_after(set.exercise_id, set.timestamp)?
            .is_some()
        {
            debug!(set_id, "Rest already captured by a later set");
            return Ok(set);
        }
        if set.rest_seconds == Some(MAX_REST_SECONDS) {
            return Ok(set);
        }

        set.rest_seconds = Some(MAX_REST_SECONDS);
        self.commit("expire_rest_timer", move |store| {
            store.update(&set)?;
            Ok(set)
        })
    }

    /// Read-only views over the exercise's sets
    pub fn analytics(&self, exercise_id: i64) -> EngineResult<Analytics> {
        Ok(Analytics::new(self.sets(exercise_id)?, self.tz))
    }

    /// Run `op` then save; roll back on any failure
    fn commit<T, F>(&mut self, operation: &str, op: F) -> EngineResult<T>
    where
        F: FnOnce(&mut S) -> EngineResult<T>,
    {
        let result = op(&mut self.store).and_then(|value| {
            self.store.save()?;
            Ok(value)
        });

        match &result {
            Ok(_) => debug!(operation, "Committed"),
            Err(e) => {
                warn!(operation, error = %e, "Operation failed, rolling back");
                if let Err(rollback) = self.store.rollback() {
                    warn!(operation, error = %rollback, "Rollback failed");
                }
            }
        }
        result
    }
}

/// Recompute the record over every set of the exercise and write back flipped flags
fn recompute_record<S: SetStore>(store: &mut S, exercise_id: i64) -> EngineResult<RecordChange> {
    let mut sets = store.fetch_sets(exercise_id, SortOrder::Ascending)?;
    let change = records::recompute(&mut sets);

    for set in &sets {
        if set.id.is_some_and(|id| change.changed.contains(&id)) {
            store.update(set)?;
        }
    }

    debug!(
        exercise_id,
        previous = ?change.previous,
        current = ?change.current,
        "Recomputed personal record"
    );
    Ok(change)
}
