//! Workout logger: the draft, the rest timer, and the save sequence.
//!
//! This is the one place where draft effects meet the timer. The draft
//! describes what should happen; [`WorkoutLogger::dispatch`] makes it happen.

use crate::draft::{DraftCommand, Effect, WorkoutDraft};
use crate::store::WorkoutStore;
use crate::timer::RestTimer;
use crate::types::{
    CompletedWorkout, Exercise, SavedWorkout, SelectedExercise, SetRecord, SetUpdate,
};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything the workout screen keeps between reloads
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkoutLogger {
    #[serde(default)]
    pub draft: WorkoutDraft,
    #[serde(default)]
    pub timer: RestTimer,
}

impl WorkoutLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a draft command and run the effects it returns
    pub fn dispatch(&mut self, command: DraftCommand) {
        for effect in self.draft.apply(command) {
            self.run_effect(effect);
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::StartRestTimer { seconds } => self.timer.start(seconds),
        }
    }

    pub fn set_exercise_input(&mut self, text: &str) {
        self.dispatch(DraftCommand::SetExerciseInput(text.to_string()));
    }

    pub fn select_exercise(&mut self, exercise: &Exercise) {
        self.dispatch(DraftCommand::SelectExercise(SelectedExercise::from(exercise)));
    }

    pub fn add_set(&mut self) {
        self.dispatch(DraftCommand::AddSet);
    }

    pub fn remove_set(&mut self, id: u32) {
        self.dispatch(DraftCommand::RemoveSet(id));
    }

    pub fn update_set(&mut self, id: u32, update: SetUpdate) {
        self.dispatch(DraftCommand::UpdateSet { id, update });
    }

    /// Mark a set done; starts the rest countdown
    pub fn complete_set(&mut self, id: u32) {
        self.update_set(id, SetUpdate::Completed(true));
    }

    /// Mark a set not done; a running countdown keeps going
    pub fn undo_set(&mut self, id: u32) {
        self.update_set(id, SetUpdate::Completed(false));
    }

    pub fn set_resting(&mut self, resting: bool) {
        self.dispatch(DraftCommand::SetResting(resting));
    }

    /// One elapsed second. Clears resting when the countdown runs out.
    pub fn tick(&mut self) -> bool {
        let expired = self.timer.tick();
        if expired {
            self.set_resting(false);
        }
        expired
    }

    /// Stop the countdown and close the rest overlay
    pub fn skip_rest(&mut self) {
        self.timer.stop();
        self.set_resting(false);
    }

    pub fn adjust_rest(&mut self, delta: i64) {
        self.timer.adjust(delta);
    }

    /// Put the countdown back to `seconds`, starting it if it is idle
    pub fn restart_rest(&mut self, seconds: u32) {
        if self.timer.is_active {
            self.timer.set_time_left(seconds);
        } else {
            self.timer.start(seconds);
            self.set_resting(seconds > 0);
        }
    }

    /// Throw the draft away
    pub fn reset(&mut self) {
        self.dispatch(DraftCommand::Reset);
    }

    /// The workout that a save would write, or None when the draft cannot be saved
    pub fn completed_workout(
        &self,
        user_id: &str,
        ended_at: DateTime<Utc>,
    ) -> Option<CompletedWorkout> {
        if !self.draft.can_finish() {
            return None;
        }
        let exercise = self.draft.selected_exercise.as_ref()?;

        let sets = self
            .draft
            .sets
            .iter()
            .enumerate()
            .map(|(index, set)| SetRecord {
                order: index as u32 + 1,
                weight: set.weight,
                reps: set.reps,
                completed: set.completed,
            })
            .collect();

        Some(CompletedWorkout {
            user_id: user_id.to_string(),
            exercise_id: exercise.id.clone(),
            total_volume: self.draft.total_volume(),
            ended_at,
            sets,
        })
    }

    /// Save the draft and start a fresh one.
    ///
    /// Returns `Ok(None)` without touching the store when no exercise is
    /// selected or there are no sets. On error the draft is left as it was.
    pub async fn finish_workout(
        &mut self,
        user_id: &str,
        store: &dyn WorkoutStore,
    ) -> Result<Option<SavedWorkout>> {
        let Some(workout) = self.completed_workout(user_id, Utc::now()) else {
            tracing::debug!("Nothing to save: no exercise selected or no sets");
            return Ok(None);
        };

        let saved = store.save_workout(&workout).await?;
        self.reset();
        Ok(Some(saved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::get_default_catalog;
    use crate::store::{MemoryStore, Statement, Step};

    fn deadlift() -> &'static Exercise {
        get_default_catalog().get("7").unwrap()
    }

    #[test]
    fn test_completing_a_set_starts_rest() {
        crate::logging::init_test();
        let mut logger = WorkoutLogger::new();
        logger.complete_set(1);
        assert!(logger.draft.is_resting);
        assert!(logger.timer.is_active);
        assert_eq!(logger.timer.time_left, 60);

        // Again from a running, partially elapsed timer
        logger.tick();
        logger.complete_set(2);
        assert_eq!(logger.timer.time_left, 60);
        assert!(logger.draft.is_resting);
    }

    #[test]
    fn test_stopping_timer_leaves_resting_to_the_draft() {
        let mut logger = WorkoutLogger::new();
        logger.complete_set(1);
        logger.timer.stop();
        assert!(logger.draft.is_resting);
        assert!(!logger.timer.is_active);
        assert_eq!(logger.timer.time_left, 0);
    }

    #[test]
    fn test_skip_rest_clears_both() {
        let mut logger = WorkoutLogger::new();
        logger.complete_set(1);
        logger.skip_rest();
        assert!(!logger.draft.is_resting);
        assert!(!logger.timer.is_active);
    }

    #[test]
    fn test_expiry_clears_resting() {
        let mut logger = WorkoutLogger::new();
        logger.complete_set(1);
        let expirations = (0..60).filter(|_| logger.tick()).count();
        assert_eq!(expirations, 1);
        assert!(!logger.draft.is_resting);
        assert!(!logger.tick());
    }

    #[test]
    fn test_undo_does_not_cancel_rest() {
        let mut logger = WorkoutLogger::new();
        logger.complete_set(1);
        logger.undo_set(1);
        assert!(logger.timer.is_active);
        assert!(!logger.draft.set(1).unwrap().completed);
    }

    #[test]
    fn test_restart_rest() {
        let mut logger = WorkoutLogger::new();
        logger.restart_rest(90);
        assert!(logger.timer.is_active);
        assert!(logger.draft.is_resting);

        logger.adjust_rest(-30);
        assert_eq!(logger.timer.time_left, 60);
        logger.restart_rest(90);
        assert_eq!(logger.timer.time_left, 90);
        assert_eq!(logger.timer.initial_time, 90);
    }

    #[test]
    fn test_select_from_catalog() {
        let mut logger = WorkoutLogger::new();
        logger.select_exercise(deadlift());
        assert_eq!(logger.draft.exercise_input, "Levantamento Terra");
        assert_eq!(logger.draft.selected_exercise.as_ref().unwrap().id, "7");
    }

    #[test]
    fn test_completed_workout_numbers_sets_from_one() {
        let mut logger = WorkoutLogger::new();
        logger.select_exercise(deadlift());
        logger.remove_set(1);
        logger.add_set();
        let workout = logger.completed_workout("u1", Utc::now()).unwrap();
        let orders: Vec<u32> = workout.sets.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert_eq!(workout.total_volume, 720.0);
        assert_eq!(workout.exercise_id, "7");
    }

    #[tokio::test]
    async fn test_finish_without_exercise_makes_no_calls() {
        let store = MemoryStore::new();
        let mut logger = WorkoutLogger::new();
        logger.complete_set(1);
        logger.add_set();

        let before = logger.clone();
        let saved = logger.finish_workout("u1", &store).await.unwrap();
        assert!(saved.is_none());
        assert!(store.statements().is_empty());
        assert_eq!(logger, before);
    }

    #[tokio::test]
    async fn test_finish_without_sets_makes_no_calls() {
        let store = MemoryStore::new();
        let mut logger = WorkoutLogger::new();
        logger.select_exercise(deadlift());
        for id in 1..=3 {
            logger.remove_set(id);
        }
        assert!(logger.finish_workout("u1", &store).await.unwrap().is_none());
        assert!(store.statements().is_empty());
    }

    #[tokio::test]
    async fn test_finish_saves_in_order_and_resets() {
        let store = MemoryStore::new();
        let mut logger = WorkoutLogger::new();
        logger.select_exercise(deadlift());
        logger.update_set(2, SetUpdate::Weight(100.0));
        logger.update_set(2, SetUpdate::Reps(5));
        logger.complete_set(1);

        let saved = logger.finish_workout("u1", &store).await.unwrap().unwrap();
        assert_eq!(saved.set_ids.len(), 3);

        let statements = store.statements();
        assert_eq!(
            statements[0],
            Statement::InsertSession {
                user_id: "u1".into(),
                // 20*12 + 100*5 + 20*12, incomplete sets included
                total_volume: 980.0,
            }
        );
        assert_eq!(
            statements[2],
            Statement::InsertSet {
                log_id: saved.log_id.clone(),
                order: 1,
                weight: 20.0,
                reps: 12,
                completed: true,
            }
        );
        assert_eq!(statements.last(), Some(&Statement::Commit));

        assert_eq!(logger.draft, WorkoutDraft::new());
        // The countdown belongs to the timer, not the draft
        assert!(logger.timer.is_active);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_draft() {
        let store = MemoryStore::new();
        store.fail_at(Step::Log);
        let mut logger = WorkoutLogger::new();
        logger.select_exercise(deadlift());
        logger.add_set();

        let before = logger.clone();
        assert!(logger.finish_workout("u1", &store).await.is_err());
        assert_eq!(logger, before);
        assert_eq!(store.saved_count(), 0);
    }
}
