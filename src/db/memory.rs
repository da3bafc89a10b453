//! In-memory record store with the same commit semantics as the database

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::db::store::{SetStore, SortOrder};
use crate::error::{StoreError, StoreResult};
use crate::exercises::{Exercise, NewExercise};
use crate::sets::WorkoutSet;

#[derive(Debug, Clone, Default)]
struct Snapshot {
    exercises: BTreeMap<i64, Exercise>,
    sets: BTreeMap<i64, WorkoutSet>,
    next_exercise_id: i64,
    next_set_id: i64,
}

/// Keeps a committed snapshot and a pending one; `save` promotes pending.
#[derive(Debug, Default)]
pub struct MemoryStore {
    committed: Snapshot,
    pending: Snapshot,
    fail_saves: bool,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `save` fail, to exercise rollback paths
    pub fn fail_saves(&mut self, fail: bool) {
        self.fail_saves = fail;
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves
    }

    fn sets_of(&self, exercise_id: i64) -> impl Iterator<Item = &WorkoutSet> {
        self.pending
            .sets
            .values()
            .filter(move |s| s.exercise_id == exercise_id)
    }
}

impl SetStore for MemoryStore {
    fn fetch_exercise(&self, exercise_id: i64) -> StoreResult<Option<Exercise>> {
        Ok(self.pending.exercises.get(&exercise_id).cloned())
    }

    fn find_exercise_by_name(&self, name: &str) -> StoreResult<Option<Exercise>> {
        let needle = name.trim().to_lowercase();
        Ok(self
            .pending
            .exercises
            .values()
            .find(|e| e.name.to_lowercase() == needle)
            .cloned())
    }

    fn list_exercises(&self) -> StoreResult<Vec<Exercise>> {
        let mut exercises: Vec<_> = self.pending.exercises.values().cloned().collect();
        exercises.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(exercises)
    }

    fn insert_exercise(&mut self, exercise: &NewExercise) -> StoreResult<i64> {
        self.pending.next_exercise_id += 1;
        let id = self.pending.next_exercise_id;
        self.pending
            .exercises
            .insert(id, exercise.clone().into_exercise(id));
        Ok(id)
    }

    fn update_exercise(&mut self, exercise: &Exercise) -> StoreResult<()> {
        if let Some(existing) = self.pending.exercises.get_mut(&exercise.id) {
            *existing = exercise.clone();
        }
        Ok(())
    }

    fn delete_exercise(&mut self, exercise_id: i64) -> StoreResult<()> {
        self.pending.exercises.remove(&exercise_id);
        self.pending.sets.retain(|_, s| s.exercise_id != exercise_id);
        Ok(())
    }

    fn fetch_sets(&self, exercise_id: i64, order: SortOrder) -> StoreResult<Vec<WorkoutSet>> {
        let mut sets: Vec<_> = self.sets_of(exercise_id).cloned().collect();
        sets.sort_by_key(|s| s.timestamp);
        if order == SortOrder::Descending {
            sets.reverse();
        }
        Ok(sets)
    }

    fn fetch_set(&self, set_id: i64) -> StoreResult<Option<WorkoutSet>> {
        Ok(self.pending.sets.get(&set_id).cloned())
    }

    fn fetch_most_recent_set_before(
        &self,
        exercise_id: i64,
        before: DateTime<Utc>,
    ) -> StoreResult<Option<WorkoutSet>> {
        Ok(self
            .sets_of(exercise_id)
            .filter(|s| s.timestamp < before)
            .max_by_key(|s| s.timestamp)
            .cloned())
    }

    fn fetch_next_set_after(
        &self,
        exercise_id: i64,
        after: DateTime<Utc>,
    ) -> StoreResult<Option<WorkoutSet>> {
        Ok(self
            .sets_of(exercise_id)
            .filter(|s| s.timestamp > after)
            .min_by_key(|s| s.timestamp)
            .cloned())
    }

    fn insert(&mut self, set: &WorkoutSet) -> StoreResult<i64> {
        let duplicate = self
            .sets_of(set.exercise_id)
            .any(|s| s.timestamp == set.timestamp);
        if duplicate {
            return Err(StoreError::Unavailable(format!(
                "set at {} already stored",
                set.timestamp
            )));
        }
        self.pending.next_set_id += 1;
        let id = self.pending.next_set_id;
        let mut stored = set.clone();
        stored.id = Some(id);
        self.pending.sets.insert(id, stored);
        Ok(id)
    }

    fn update(&mut self, set: &WorkoutSet) -> StoreResult<()> {
        let id = set.id.ok_or_else(|| {
            StoreError::Unavailable("cannot update a set that was never inserted".to_string())
        })?;
        match self.pending.sets.get_mut(&id) {
            Some(existing) => {
                *existing = set.clone();
                Ok(())
            }
            None => Err(StoreError::Unavailable(format!("set {} not stored", id))),
        }
    }

    fn delete(&mut self, set_id: i64) -> StoreResult<()> {
        self.pending.sets.remove(&set_id);
        Ok(())
    }

    fn save(&mut self) -> StoreResult<()> {
        if self.fail_saves {
            return Err(StoreError::Unavailable("save rejected".to_string()));
        }
        self.committed = self.pending.clone();
        self.saves += 1;
        Ok(())
    }

    fn rollback(&mut self) -> StoreResult<()> {
        self.pending = self.committed.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sets::NewSet;
    use chrono::Duration;

    fn create_store() -> (MemoryStore, i64) {
        let mut store = MemoryStore::new();
        let id = store.insert_exercise(&NewExercise::new("Curl")).unwrap();
        store.save().unwrap();
        (store, id)
    }

    #[test]
    fn test_reads_see_pending_writes() {
        let (mut store, ex) = create_store();
        let set = NewSet::new(20.0, 10, Utc::now()).into_set(ex).unwrap();
        let id = store.insert(&set).unwrap();
        assert!(store.fetch_set(id).unwrap().is_some());
    }

    #[test]
    fn test_rollback_restores_committed() {
        let (mut store, ex) = create_store();
        let set = NewSet::new(20.0, 10, Utc::now()).into_set(ex).unwrap();
        store.insert(&set).unwrap();
        store.rollback().unwrap();
        assert!(store.fetch_sets(ex, SortOrder::Ascending).unwrap().is_empty());
    }

    #[test]
    fn test_failed_save_keeps_pending_until_rollback() {
        let (mut store, ex) = create_store();
        store.fail_saves(true);
        let set = NewSet::new(20.0, 10, Utc::now()).into_set(ex).unwrap();
        store.insert(&set).unwrap();
        assert!(store.save().is_err());
        store.rollback().unwrap();
        assert!(store.fetch_sets(ex, SortOrder::Ascending).unwrap().is_empty());
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_most_recent_before() {
        let (mut store, ex) = create_store();
        let now = Utc::now();
        for (i, weight) in [20.0, 22.5, 25.0].iter().enumerate() {
            let set = NewSet::new(*weight, 10, now + Duration::minutes(i as i64))
                .into_set(ex)
                .unwrap();
            store.insert(&set).unwrap();
        }
        let prev = store
            .fetch_most_recent_set_before(ex, now + Duration::minutes(2))
            .unwrap()
            .unwrap();
        assert_eq!(prev.weight, 22.5);
    }

    #[test]
    fn test_delete_exercise_cascades() {
        let (mut store, ex) = create_store();
        let set = NewSet::new(20.0, 10, Utc::now()).into_set(ex).unwrap();
        let id = store.insert(&set).unwrap();
        store.delete_exercise(ex).unwrap();
        assert!(store.fetch_set(id).unwrap().is_none());
        assert!(store.fetch_exercise(ex).unwrap().is_none());
    }
}
