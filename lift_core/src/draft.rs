//! The in-progress workout and every mutation allowed on it.
//!
//! All changes go through [`WorkoutDraft::apply`]. A command never reaches
//! into another subsystem; anything it wants done elsewhere (starting the rest
//! timer) comes back as an [`Effect`] for the caller to run.

use crate::sanitize::sanitize;
use crate::types::{SelectedExercise, SetUpdate, WorkoutSetDraft};
use serde::{Deserialize, Serialize};

/// Rest started automatically when a set is marked complete
pub const COMPLETED_SET_REST_SECS: u32 = 60;

/// Values for a set appended to an empty list
pub const EMPTY_LIST_WEIGHT: f64 = 0.0;
pub const EMPTY_LIST_REPS: u32 = 12;

/// Placeholder sets a fresh draft starts with
const PLACEHOLDER_SETS: u32 = 3;
const PLACEHOLDER_WEIGHT: f64 = 20.0;
const PLACEHOLDER_REPS: u32 = 12;

/// A requested change to the draft
#[derive(Clone, Debug, PartialEq)]
pub enum DraftCommand {
    /// Replace the free-text search term (sanitized)
    SetExerciseInput(String),
    /// Choose a catalog exercise; its name becomes the search term
    SelectExercise(SelectedExercise),
    AddSet,
    RemoveSet(u32),
    UpdateSet { id: u32, update: SetUpdate },
    SetResting(bool),
    Reset,
}

/// Work a command asks the caller to perform outside the draft
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    StartRestTimer { seconds: u32 },
}

/// The unsaved workout being composed
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutDraft {
    pub exercise_input: String,
    pub selected_exercise: Option<SelectedExercise>,
    pub sets: Vec<WorkoutSetDraft>,
    pub is_resting: bool,
    /// Next id handed out by `AddSet`; only ever grows within one draft
    #[serde(default)]
    next_set_id: u32,
}

impl Default for WorkoutDraft {
    fn default() -> Self {
        let sets = (1..=PLACEHOLDER_SETS)
            .map(|id| WorkoutSetDraft {
                id,
                reps: PLACEHOLDER_REPS,
                weight: PLACEHOLDER_WEIGHT,
                completed: false,
                notes: None,
                show_notes: false,
            })
            .collect();

        Self {
            exercise_input: String::new(),
            selected_exercise: None,
            sets,
            is_resting: false,
            next_set_id: PLACEHOLDER_SETS + 1,
        }
    }
}

impl WorkoutDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one command and return the effects it requests
    pub fn apply(&mut self, command: DraftCommand) -> Vec<Effect> {
        match command {
            DraftCommand::SetExerciseInput(text) => {
                self.exercise_input = sanitize(&text);
                Vec::new()
            }
            DraftCommand::SelectExercise(exercise) => {
                self.exercise_input = exercise.name.clone();
                self.selected_exercise = Some(exercise);
                Vec::new()
            }
            DraftCommand::AddSet => {
                self.add_set();
                Vec::new()
            }
            DraftCommand::RemoveSet(id) => {
                self.sets.retain(|s| s.id != id);
                Vec::new()
            }
            DraftCommand::UpdateSet { id, update } => self.update_set(id, update),
            DraftCommand::SetResting(resting) => {
                self.is_resting = resting;
                Vec::new()
            }
            DraftCommand::Reset => {
                *self = Self::default();
                Vec::new()
            }
        }
    }

    fn add_set(&mut self) {
        let (weight, reps) = self
            .sets
            .last()
            .map(|last| (last.weight, last.reps))
            .unwrap_or((EMPTY_LIST_WEIGHT, EMPTY_LIST_REPS));

        // Keep the counter ahead of any id restored from older state files
        let max_live = self.sets.iter().map(|s| s.id).max().unwrap_or(0);
        let next = max_live
            .checked_add(1)
            .map(|floor| self.next_set_id.max(floor))
            .and_then(|id| Some((id, id.checked_add(1)?)));
        let Some((id, after)) = next else {
            tracing::warn!("Set ids exhausted, not adding a set");
            return;
        };
        self.next_set_id = after;

        self.sets.push(WorkoutSetDraft {
            id,
            reps,
            weight,
            completed: false,
            notes: None,
            show_notes: false,
        });
    }

    fn update_set(&mut self, id: u32, update: SetUpdate) -> Vec<Effect> {
        let Some(set) = self.sets.iter_mut().find(|s| s.id == id) else {
            tracing::debug!("Ignoring update for unknown set {}", id);
            return Vec::new();
        };

        match update {
            SetUpdate::Reps(reps) => set.reps = reps,
            SetUpdate::Weight(weight) => set.weight = weight,
            SetUpdate::Notes(text) => set.notes = Some(sanitize(&text)),
            SetUpdate::ShowNotes(show) => set.show_notes = show,
            SetUpdate::Completed(completed) => {
                set.completed = completed;
                if completed {
                    self.is_resting = true;
                    return vec![Effect::StartRestTimer {
                        seconds: COMPLETED_SET_REST_SECS,
                    }];
                }
            }
        }
        Vec::new()
    }

    /// Σ weight × reps over every set, completed or not
    pub fn total_volume(&self) -> f64 {
        self.sets.iter().map(WorkoutSetDraft::volume).sum()
    }

    pub fn completed_count(&self) -> usize {
        self.sets.iter().filter(|s| s.completed).count()
    }

    /// A save needs a chosen exercise and at least one set
    pub fn can_finish(&self) -> bool {
        self.selected_exercise.is_some() && !self.sets.is_empty()
    }

    pub fn set(&self, id: u32) -> Option<&WorkoutSetDraft> {
        self.sets.iter().find(|s| s.id == id)
    }
}
