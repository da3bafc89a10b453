//! Database module - SQLite storage for exercises and sets

pub mod memory;
pub mod store;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::exercises::{Exercise, NewExercise, tags_from_column, tags_to_column};
use crate::sets::WorkoutSet;

pub use memory::MemoryStore;
pub use store::{SetStore, SortOrder};

const SET_COLUMNS: &str = "id, exercise_id, weight, reps, timestamp, is_warm_up, is_bonus, \
    is_drop_set, is_assisted, is_pause_at_top, is_timed_set, tempo_seconds, is_pb, rest_seconds";

/// Position of `timestamp` in `SET_COLUMNS`
const TIMESTAMP_COLUMN: usize = 4;

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> StoreResult<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS exercises (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                tags TEXT NOT NULL DEFAULT '',
                note TEXT
            );
            CREATE TABLE IF NOT EXISTS sets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                exercise_id INTEGER NOT NULL REFERENCES exercises(id),
                weight REAL NOT NULL,
                reps INTEGER NOT NULL,
                timestamp TEXT NOT NULL,
                is_warm_up INTEGER NOT NULL DEFAULT 0,
                is_bonus INTEGER NOT NULL DEFAULT 0,
                is_drop_set INTEGER NOT NULL DEFAULT 0,
                is_assisted INTEGER NOT NULL DEFAULT 0,
                is_pause_at_top INTEGER NOT NULL DEFAULT 0,
                is_timed_set INTEGER NOT NULL DEFAULT 0,
                tempo_seconds INTEGER,
                is_pb INTEGER NOT NULL DEFAULT 0,
                rest_seconds INTEGER,
                UNIQUE (exercise_id, timestamp)
            );
            CREATE INDEX IF NOT EXISTS idx_sets_exercise_time ON sets (exercise_id, timestamp);",
        )?;
        Ok(())
    }

    /// Open a transaction unless one is already pending
    fn begin(&self) -> rusqlite::Result<()> {
        if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN")?;
        }
        Ok(())
    }

    /// Whether writes are waiting for `save`
    pub fn has_pending_writes(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn query_sets(&self, sql: &str, params: impl rusqlite::Params) -> StoreResult<Vec<WorkoutSet>> {
        let mut stmt = self.conn.prepare(sql)?;
        let sets = stmt
            .query_map(params, row_to_set)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sets)
    }
}

/// Fixed-width UTC text so that lexical order matches time order
fn timestamp_to_column(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn timestamp_from_row(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_set(row: &Row) -> rusqlite::Result<WorkoutSet> {
    Ok(WorkoutSet {
        id: Some(row.get("id")?),
        exercise_id: row.get("exercise_id")?,
        weight: row.get("weight")?,
        reps: row.get("reps")?,
        timestamp: timestamp_from_row(row, TIMESTAMP_COLUMN)?,
        is_warm_up: row.get("is_warm_up")?,
        is_bonus: row.get("is_bonus")?,
        is_drop_set: row.get("is_drop_set")?,
        is_assisted: row.get("is_assisted")?,
        is_pause_at_top: row.get("is_pause_at_top")?,
        is_timed_set: row.get("is_timed_set")?,
        tempo_seconds: row.get("tempo_seconds")?,
        is_pb: row.get("is_pb")?,
        rest_seconds: row.get("rest_seconds")?,
    })
}

fn row_to_exercise(row: &Row) -> rusqlite::Result<Exercise> {
    let tags: String = row.get("tags")?;
    Ok(Exercise {
        id: row.get("id")?,
        name: row.get("name")?,
        tags: tags_from_column(&tags),
        note: row.get("note")?,
    })
}

impl SetStore for Database {
    fn fetch_exercise(&self, exercise_id: i64) -> StoreResult<Option<Exercise>> {
        let exercise = self
            .conn
            .query_row(
                "SELECT id, name, tags, note FROM exercises WHERE id = ?1",
                params![exercise_id],
                row_to_exercise,
            )
            .optional()?;
        Ok(exercise)
    }

    fn find_exercise_by_name(&self, name: &str) -> StoreResult<Option<Exercise>> {
        let exercise = self
            .conn
            .query_row(
                "SELECT id, name, tags, note FROM exercises WHERE name = ?1 COLLATE NOCASE",
                params![name.trim()],
                row_to_exercise,
            )
            .optional()?;
        Ok(exercise)
    }

    fn list_exercises(&self) -> StoreResult<Vec<Exercise>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, tags, note FROM exercises ORDER BY name")?;
        let exercises = stmt
            .query_map([], row_to_exercise)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(exercises)
    }

    fn insert_exercise(&mut self, exercise: &NewExercise) -> StoreResult<i64> {
        self.begin()?;
        self.conn.execute(
            "INSERT INTO exercises (name, tags, note) VALUES (?1, ?2, ?3)",
            params![exercise.name, tags_to_column(&exercise.tags), exercise.note],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_exercise(&mut self, exercise: &Exercise) -> StoreResult<()> {
        self.begin()?;
        self.conn.execute(
            "UPDATE exercises SET name = ?1, tags = ?2, note = ?3 WHERE id = ?4",
            params![exercise.name, tags_to_column(&exercise.tags), exercise.note, exercise.id],
        )?;
        Ok(())
    }

    fn delete_exercise(&mut self, exercise_id: i64) -> StoreResult<()> {
        self.begin()?;
        let removed = self
            .conn
            .execute("DELETE FROM sets WHERE exercise_id = ?1", params![exercise_id])?;
        self.conn
            .execute("DELETE FROM exercises WHERE id = ?1", params![exercise_id])?;
        debug!(exercise_id, removed, "Deleted exercise with its sets");
        Ok(())
    }

    fn fetch_sets(&self, exercise_id: i64, order: SortOrder) -> StoreResult<Vec<WorkoutSet>> {
        let direction = match order {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        };
        let sql = format!(
            "SELECT {SET_COLUMNS} FROM sets WHERE exercise_id = ?1 ORDER BY timestamp {direction}"
        );
        self.query_sets(&sql, params![exercise_id])
    }

    fn fetch_working_sets(&self, exercise_id: i64, order: SortOrder) -> StoreResult<Vec<WorkoutSet>> {
        let direction = match order {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        };
        let sql = format!(
            "SELECT {SET_COLUMNS} FROM sets WHERE exercise_id = ?1 AND is_warm_up = 0 \
             ORDER BY timestamp {direction}"
        );
        self.query_sets(&sql, params![exercise_id])
    }

    fn fetch_set(&self, set_id: i64) -> StoreResult<Option<WorkoutSet>> {
        let sql = format!("SELECT {SET_COLUMNS} FROM sets WHERE id = ?1");
        let set = self
            .conn
            .query_row(&sql, params![set_id], row_to_set)
            .optional()?;
        Ok(set)
    }

    fn fetch_most_recent_set_before(
        &self,
        exercise_id: i64,
        before: DateTime<Utc>,
    ) -> StoreResult<Option<WorkoutSet>> {
        let sql = format!(
            "SELECT {SET_COLUMNS} FROM sets WHERE exercise_id = ?1 AND timestamp < ?2 \
             ORDER BY timestamp DESC LIMIT 1"
        );
        let set = self
            .conn
            .query_row(&sql, params![exercise_id, timestamp_to_column(&before)], row_to_set)
            .optional()?;
        Ok(set)
    }

    fn fetch_next_set_after(
        &self,
        exercise_id: i64,
        after: DateTime<Utc>,
    ) -> StoreResult<Option<WorkoutSet>> {
        let sql = format!(
            "SELECT {SET_COLUMNS} FROM sets WHERE exercise_id = ?1 AND timestamp > ?2 \
             ORDER BY timestamp ASC LIMIT 1"
        );
        let set = self
            .conn
            .query_row(&sql, params![exercise_id, timestamp_to_column(&after)], row_to_set)
            .optional()?;
        Ok(set)
    }

    fn insert(&mut self, set: &WorkoutSet) -> StoreResult<i64> {
        self.begin()?;
        self.conn.execute(
            "INSERT INTO sets (exercise_id, weight, reps, timestamp, is_warm_up, is_bonus, \
             is_drop_set, is_assisted, is_pause_at_top, is_timed_set, tempo_seconds, is_pb, rest_seconds) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                set.exercise_id,
                set.weight,
                set.reps,
                timestamp_to_column(&set.timestamp),
                set.is_warm_up,
                set.is_bonus,
                set.is_drop_set,
                set.is_assisted,
                set.is_pause_at_top,
                set.is_timed_set,
                set.tempo_seconds,
                set.is_pb,
                set.rest_seconds,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&mut self, set: &WorkoutSet) -> StoreResult<()> {
        let Some(id) = set.id else {
            return Err(StoreError::Unavailable(
                "cannot update a set that was never inserted".to_string(),
            ));
        };
        self.begin()?;
        self.conn.execute(
            "UPDATE sets SET weight = ?1, reps = ?2, timestamp = ?3, is_warm_up = ?4, is_bonus = ?5, \
             is_drop_set = ?6, is_assisted = ?7, is_pause_at_top = ?8, is_timed_set = ?9, \
             tempo_seconds = ?10, is_pb = ?11, rest_seconds = ?12 WHERE id = ?13",
            params![
                set.weight,
                set.reps,
                timestamp_to_column(&set.timestamp),
                set.is_warm_up,
                set.is_bonus,
                set.is_drop_set,
                set.is_assisted,
                set.is_pause_at_top,
                set.is_timed_set,
                set.tempo_seconds,
                set.is_pb,
                set.rest_seconds,
                id,
            ],
        )?;
        Ok(())
    }

    fn delete(&mut self, set_id: i64) -> StoreResult<()> {
        self.begin()?;
        self.conn
            .execute("DELETE FROM sets WHERE id = ?1", params![set_id])?;
        Ok(())
    }

    fn save(&mut self) -> StoreResult<()> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> StoreResult<()> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }
}
