//! In-process workout storage that records every statement it runs.
//!
//! Used by tests and dry runs to observe the save sequence without a database.

use super::{summarize, WorkoutStore};
use crate::types::{Catalog, CompletedWorkout, SavedWorkout, WorkoutSummary};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};

/// A statement issued against the store, in the order it ran
#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    InsertSession {
        user_id: String,
        total_volume: f64,
    },
    InsertLog {
        session_id: String,
        exercise_id: String,
    },
    InsertSet {
        log_id: String,
        order: u32,
        weight: f64,
        reps: u32,
        completed: bool,
    },
    Commit,
    Rollback,
}

/// A save step at which a failure can be injected
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Session,
    Log,
    /// The set with this 1-based order
    Set(u32),
}

#[derive(Default)]
struct MemoryState {
    statements: Vec<Statement>,
    workouts: Vec<(String, CompletedWorkout)>,
    fail_at: Option<Step>,
    next_id: u64,
    catalog: Option<Catalog>,
}

impl MemoryState {
    fn generate_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    fn check(&mut self, step: Step) -> Result<()> {
        if self.fail_at == Some(step) {
            self.statements.push(Statement::Rollback);
            return Err(Error::Other(format!("injected failure at {:?}", step)));
        }
        Ok(())
    }
}

/// Workout storage held in memory
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that also serves `catalog` from `load_exercises`
    pub fn with_catalog(catalog: Catalog) -> Self {
        let store = Self::new();
        if let Ok(mut state) = store.state.lock() {
            state.catalog = Some(catalog);
        }
        store
    }

    /// Make the next saves fail at `step`
    pub fn fail_at(&self, step: Step) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_at = Some(step);
        }
    }

    /// Statements issued so far
    pub fn statements(&self) -> Vec<Statement> {
        self.state
            .lock()
            .map(|s| s.statements.clone())
            .unwrap_or_default()
    }

    /// Number of committed workouts
    pub fn saved_count(&self) -> usize {
        self.state.lock().map(|s| s.workouts.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| Error::State("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl WorkoutStore for MemoryStore {
    async fn save_workout(&self, workout: &CompletedWorkout) -> Result<SavedWorkout> {
        let mut state = self.lock()?;

        state.check(Step::Session)?;
        let session_id = state.generate_id();
        state.statements.push(Statement::InsertSession {
            user_id: workout.user_id.clone(),
            total_volume: workout.total_volume,
        });

        state.check(Step::Log)?;
        let log_id = state.generate_id();
        state.statements.push(Statement::InsertLog {
            session_id: session_id.clone(),
            exercise_id: workout.exercise_id.clone(),
        });

        let mut set_ids = Vec::with_capacity(workout.sets.len());
        for set in &workout.sets {
            state.check(Step::Set(set.order))?;
            set_ids.push(state.generate_id());
            state.statements.push(Statement::InsertSet {
                log_id: log_id.clone(),
                order: set.order,
                weight: set.weight,
                reps: set.reps,
                completed: set.completed,
            });
        }

        state.statements.push(Statement::Commit);
        state.workouts.push((session_id.clone(), workout.clone()));

        Ok(SavedWorkout {
            session_id,
            log_id,
            set_ids,
        })
    }

    async fn recent_workouts(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<WorkoutSummary>> {
        let state = self.lock()?;
        let mut summaries: Vec<WorkoutSummary> = state
            .workouts
            .iter()
            .filter(|(_, w)| w.user_id == user_id && w.ended_at >= since)
            .map(|(id, w)| summarize(id, w))
            .collect();
        summaries.sort_by(|a, b| b.ended_at.cmp(&a.ended_at));
        Ok(summaries)
    }

    async fn load_exercises(&self) -> Result<Option<Catalog>> {
        Ok(self.lock()?.catalog.clone())
    }
}
