//! Local workout journal.
//!
//! Each saved workout is appended as one JSON line with file locking, so a
//! single `append` is the whole commit: either the line is written or nothing is.

use super::{summarize, WorkoutStore};
use crate::types::{Catalog, CompletedWorkout, SavedWorkout, WorkoutSummary};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One line of the journal
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JournalEntry {
    pub session_id: String,
    pub log_id: String,
    pub set_ids: Vec<String>,
    pub workout: CompletedWorkout,
}

/// JSONL-based workout store with file locking
pub struct JournalStore {
    path: PathBuf,
}

impl JournalStore {
    /// Create a journal store for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, entry: &JournalEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(entry)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.sync_all()?;
        file.unlock()?;

        tracing::debug!("Appended session {} to journal", entry.session_id);
        Ok(())
    }
}

/// Read all entries from a journal file
///
/// Unparseable lines are skipped with a warning.
pub fn read_entries(path: &Path) -> Result<Vec<JournalEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut entries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<JournalEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!("Failed to parse journal entry at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} entries from journal", entries.len());
    Ok(entries)
}

#[async_trait]
impl WorkoutStore for JournalStore {
    async fn save_workout(&self, workout: &CompletedWorkout) -> Result<SavedWorkout> {
        let entry = JournalEntry {
            session_id: Uuid::new_v4().to_string(),
            log_id: Uuid::new_v4().to_string(),
            set_ids: workout
                .sets
                .iter()
                .map(|_| Uuid::new_v4().to_string())
                .collect(),
            workout: workout.clone(),
        };
        self.append(&entry)?;

        tracing::info!(
            "Saved workout session {} to {:?} ({} sets)",
            entry.session_id,
            self.path,
            entry.set_ids.len()
        );
        Ok(SavedWorkout {
            session_id: entry.session_id,
            log_id: entry.log_id,
            set_ids: entry.set_ids,
        })
    }

    async fn recent_workouts(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<WorkoutSummary>> {
        let mut summaries: Vec<WorkoutSummary> = read_entries(&self.path)?
            .iter()
            .filter(|e| e.workout.user_id == user_id && e.workout.ended_at >= since)
            .map(|e| summarize(&e.session_id, &e.workout))
            .collect();
        summaries.sort_by(|a, b| b.ended_at.cmp(&a.ended_at));
        Ok(summaries)
    }

    async fn load_exercises(&self) -> Result<Option<Catalog>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SetRecord;
    use chrono::Duration;

    fn create_test_workout(user_id: &str, ended_at: DateTime<Utc>) -> CompletedWorkout {
        CompletedWorkout {
            user_id: user_id.into(),
            exercise_id: "1".into(),
            total_volume: 480.0,
            ended_at,
            sets: vec![
                SetRecord { order: 1, weight: 20.0, reps: 12, completed: true },
                SetRecord { order: 2, weight: 20.0, reps: 12, completed: false },
            ],
        }
    }

    #[tokio::test]
    async fn test_save_and_read_single_workout() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("workouts.jsonl");

        let store = JournalStore::new(&path);
        let saved = store
            .save_workout(&create_test_workout("u1", Utc::now()))
            .await
            .unwrap();

        let entries = read_entries(&path).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].session_id, saved.session_id);
        assert_eq!(entries[0].set_ids.len(), 2);
        assert_eq!(entries[0].workout.sets[1].order, 2);
    }

    #[tokio::test]
    async fn test_recent_workouts_window_and_order() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JournalStore::new(temp_dir.path().join("nested/workouts.jsonl"));
        let now = Utc::now();

        store.save_workout(&create_test_workout("u1", now - Duration::days(10))).await.unwrap();
        store.save_workout(&create_test_workout("u1", now - Duration::days(2))).await.unwrap();
        store.save_workout(&create_test_workout("u1", now - Duration::hours(1))).await.unwrap();
        store.save_workout(&create_test_workout("u2", now)).await.unwrap();

        let recent = store
            .recent_workouts("u1", now - Duration::days(7))
            .await
            .unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent[0].ended_at > recent[1].ended_at);
        assert_eq!(recent[0].completed_sets, 1);
        assert_eq!(recent[0].exercise_id.as_deref(), Some("1"));
    }

    #[test]
    fn test_read_skips_corrupt_lines() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("workouts.jsonl");
        let good = JournalEntry {
            session_id: "s".into(),
            log_id: "l".into(),
            set_ids: vec![],
            workout: create_test_workout("u1", Utc::now()),
        };
        let contents = format!("{}\n{{ broken\n\n", serde_json::to_string(&good).unwrap());
        std::fs::write(&path, contents).unwrap();

        let entries = read_entries(&path).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_read_missing_journal() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(read_entries(&temp_dir.path().join("none.jsonl")).unwrap().is_empty());
    }
}
