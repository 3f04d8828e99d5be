//! Durable storage for finished workouts.
//!
//! A save is one atomic command: session row, then log row, then one row per
//! set, each step using the id generated by the one before.

use crate::config::Config;
use crate::types::{Catalog, CompletedWorkout, SavedWorkout, WorkoutSummary};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod journal;
pub mod memory;
pub mod postgres;

pub use journal::JournalStore;
pub use memory::{MemoryStore, Statement, Step};
pub use postgres::PostgresStore;

/// Storage backend for finished workouts
#[async_trait]
pub trait WorkoutStore: Send + Sync {
    /// Commit a finished workout; nothing is kept if any step fails
    async fn save_workout(&self, workout: &CompletedWorkout) -> Result<SavedWorkout>;

    /// Sessions for `user_id` that ended at or after `since`, newest first
    async fn recent_workouts(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<WorkoutSummary>>;

    /// The exercise catalog kept by this backend, if it has one
    async fn load_exercises(&self) -> Result<Option<Catalog>>;
}

/// The store the configuration points at: Postgres when a database url is
/// set, the local journal otherwise
pub fn open_store(config: &Config) -> Box<dyn WorkoutStore> {
    match &config.database.url {
        Some(url) => {
            tracing::debug!("Using Postgres workout store");
            Box::new(PostgresStore::new(
                url.clone(),
                config.database.statement_timeout_secs,
            ))
        }
        None => {
            tracing::debug!("Using local journal at {:?}", config.journal_path());
            Box::new(JournalStore::new(config.journal_path()))
        }
    }
}

/// Summary of a workout from the values that were sent to storage
pub(crate) fn summarize(session_id: &str, workout: &CompletedWorkout) -> WorkoutSummary {
    WorkoutSummary {
        session_id: session_id.to_string(),
        ended_at: workout.ended_at,
        total_volume: workout.total_volume,
        exercise_id: Some(workout.exercise_id.clone()),
        set_count: workout.sets.len() as u32,
        completed_sets: workout.sets.iter().filter(|s| s.completed).count() as u32,
    }
}
