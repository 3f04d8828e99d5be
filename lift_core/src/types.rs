//! Core domain types for the workout logger.
//!
//! This module defines the fundamental types used throughout the system:
//! - Catalog exercises and the denormalized selection reference
//! - Draft sets and their typed field updates
//! - Finished workouts as handed to a persistence store
//! - Summaries read back for progress history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Catalog Types
// ============================================================================

/// A known exercise in the catalog
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub muscle_group: String,
    #[serde(default)]
    pub equipment: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
}

/// Reference to a catalog exercise with the display fields the draft needs
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SelectedExercise {
    pub id: String,
    pub name: String,
    pub muscle_group: String,
    pub image_url: Option<String>,
}

impl From<&Exercise> for SelectedExercise {
    fn from(exercise: &Exercise) -> Self {
        Self {
            id: exercise.id.clone(),
            name: exercise.name.clone(),
            muscle_group: exercise.muscle_group.clone(),
            image_url: exercise.image_url.clone(),
        }
    }
}

/// The list of exercises available for selection, in catalog order
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub exercises: Vec<Exercise>,
}

// ============================================================================
// Draft Types
// ============================================================================

/// One editable set in the in-progress workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSetDraft {
    pub id: u32,
    pub reps: u32,
    pub weight: f64,
    pub completed: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub show_notes: bool,
}

impl WorkoutSetDraft {
    /// Volume contributed by this set (weight x reps)
    pub fn volume(&self) -> f64 {
        self.weight * f64::from(self.reps)
    }
}

/// A typed assignment to one field of a draft set
#[derive(Clone, Debug, PartialEq)]
pub enum SetUpdate {
    Reps(u32),
    Weight(f64),
    Completed(bool),
    /// Free text, sanitized before it is stored
    Notes(String),
    ShowNotes(bool),
}

// ============================================================================
// Persistence Types
// ============================================================================

/// One set as written to durable storage
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetRecord {
    /// 1-based position in the draft
    pub order: u32,
    pub weight: f64,
    pub reps: u32,
    pub completed: bool,
}

/// A finished workout, ready to be committed by a `WorkoutStore`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CompletedWorkout {
    pub user_id: String,
    pub exercise_id: String,
    pub total_volume: f64,
    pub ended_at: DateTime<Utc>,
    pub sets: Vec<SetRecord>,
}

/// Identifiers generated while committing a workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SavedWorkout {
    pub session_id: String,
    pub log_id: String,
    pub set_ids: Vec<String>,
}

/// A saved session as read back for progress history
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSummary {
    pub session_id: String,
    pub ended_at: DateTime<Utc>,
    pub total_volume: f64,
    pub exercise_id: Option<String>,
    pub set_count: u32,
    pub completed_sets: u32,
}
