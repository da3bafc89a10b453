//! Record store collaborator used by the engine

use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::exercises::{Exercise, NewExercise};
use crate::sets::WorkoutSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Persistent record store for exercises and their sets.
///
/// Writes (`insert*`, `update*`, `delete*`) are pending until `save` makes
/// them durable; `rollback` discards everything since the last `save`.
/// Reads see pending writes.
pub trait SetStore {
    fn fetch_exercise(&self, exercise_id: i64) -> StoreResult<Option<Exercise>>;

    fn find_exercise_by_name(&self, name: &str) -> StoreResult<Option<Exercise>>;

    fn list_exercises(&self) -> StoreResult<Vec<Exercise>>;

    fn insert_exercise(&mut self, exercise: &NewExercise) -> StoreResult<i64>;

    fn update_exercise(&mut self, exercise: &Exercise) -> StoreResult<()>;

    /// Deletes the exercise together with all of its sets
    fn delete_exercise(&mut self, exercise_id: i64) -> StoreResult<()>;

    /// Every set of the exercise, warm-ups included
    fn fetch_sets(&self, exercise_id: i64, order: SortOrder) -> StoreResult<Vec<WorkoutSet>>;

    /// Non-warm-up sets of the exercise
    fn fetch_working_sets(&self, exercise_id: i64, order: SortOrder) -> StoreResult<Vec<WorkoutSet>> {
        Ok(self
            .fetch_sets(exercise_id, order)?
            .into_iter()
            .filter(|s| !s.is_warm_up)
            .collect())
    }

    fn fetch_set(&self, set_id: i64) -> StoreResult<Option<WorkoutSet>>;

    /// Latest set strictly before `before`, any flags
    fn fetch_most_recent_set_before(
        &self,
        exercise_id: i64,
        before: DateTime<Utc>,
    ) -> StoreResult<Option<WorkoutSet>>;

    /// Earliest set strictly after `after`, any flags
    fn fetch_next_set_after(
        &self,
        exercise_id: i64,
        after: DateTime<Utc>,
    ) -> StoreResult<Option<WorkoutSet>>;

    /// Insert a set and return its id
    fn insert(&mut self, set: &WorkoutSet) -> StoreResult<i64>;

    fn update(&mut self, set: &WorkoutSet) -> StoreResult<()>;

    fn delete(&mut self, set_id: i64) -> StoreResult<()>;

    fn save(&mut self) -> StoreResult<()>;

    fn rollback(&mut self) -> StoreResult<()>;
}
