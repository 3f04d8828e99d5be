#![forbid(unsafe_code)]

//! Core domain model and business logic for the lift workout logger.
//!
//! This crate provides:
//! - Domain types (exercises, draft sets, finished workouts)
//! - Exercise catalog, search and suggestion navigation
//! - Input sanitizing
//! - Workout draft store and rest timer
//! - Persistence (local state, journal, Postgres)

pub mod types;
pub mod error;
pub mod sanitize;
pub mod catalog;
pub mod autocomplete;
pub mod timer;
pub mod draft;
pub mod logger;
pub mod state;
pub mod store;
pub mod history;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use sanitize::sanitize;
pub use catalog::{build_default_catalog, get_default_catalog, load_configured_catalog};
pub use autocomplete::{Autocomplete, Key};
pub use timer::RestTimer;
pub use draft::{DraftCommand, Effect, WorkoutDraft, COMPLETED_SET_REST_SECS};
pub use logger::WorkoutLogger;
pub use store::{open_store, JournalStore, MemoryStore, PostgresStore, WorkoutStore};
pub use history::{load_recent_workouts, HistoryReport};
pub use config::Config;
