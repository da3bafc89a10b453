//! setlog - Workout set log with personal records and progression targets

pub mod analytics;
pub mod db;
pub mod engine;
pub mod error;
pub mod exercises;
pub mod sets;

pub use analytics::Analytics;
pub use db::Database;
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
