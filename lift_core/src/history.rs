//! Progress history over a trailing window of days.

use crate::store::WorkoutStore;
use crate::types::WorkoutSummary;
use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};

/// Saved sessions in a window plus their totals
#[derive(Clone, Debug, Default)]
pub struct HistoryReport {
    pub days: i64,
    pub sessions: Vec<WorkoutSummary>,
}

impl HistoryReport {
    pub fn total_volume(&self) -> f64 {
        self.sessions.iter().map(|s| s.total_volume).sum()
    }

    pub fn total_sets(&self) -> u32 {
        self.sessions.iter().map(|s| s.set_count).sum()
    }

    pub fn completed_sets(&self) -> u32 {
        self.sessions.iter().map(|s| s.completed_sets).sum()
    }

    /// Share of logged sets that were marked complete, 0.0 when nothing was logged
    pub fn completion_rate(&self) -> f64 {
        match self.total_sets() {
            0 => 0.0,
            total => f64::from(self.completed_sets()) / f64::from(total),
        }
    }
}

/// Load sessions for `user_id` from the last `days` days, newest first
pub async fn load_recent_workouts(
    store: &dyn WorkoutStore,
    user_id: &str,
    days: i64,
) -> Result<HistoryReport> {
    if days < 0 {
        return Err(Error::Other(format!("History window must not be negative: {}", days)));
    }
    // Windows reaching past the epoch cover every session
    let epoch = DateTime::<Utc>::UNIX_EPOCH;
    let cutoff = Duration::try_days(days)
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .map_or(epoch, |cutoff| cutoff.max(epoch));
    let sessions = store.recent_workouts(user_id, cutoff).await?;
    tracing::debug!("Loaded {} sessions from the last {} days", sessions.len(), days);
    Ok(HistoryReport { days, sessions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{CompletedWorkout, SetRecord};

    fn workout(volume: f64, completed: &[bool]) -> CompletedWorkout {
        CompletedWorkout {
            user_id: "u1".into(),
            exercise_id: "5".into(),
            total_volume: volume,
            ended_at: Utc::now(),
            sets: completed
                .iter()
                .enumerate()
                .map(|(i, done)| SetRecord {
                    order: i as u32 + 1,
                    weight: 10.0,
                    reps: 10,
                    completed: *done,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_report_totals() {
        let store = MemoryStore::new();
        store.save_workout(&workout(300.0, &[true, true, false])).await.unwrap();
        store.save_workout(&workout(100.0, &[true])).await.unwrap();

        let report = load_recent_workouts(&store, "u1", 7).await.unwrap();
        assert_eq!(report.sessions.len(), 2);
        assert_eq!(report.total_volume(), 400.0);
        assert_eq!(report.total_sets(), 4);
        assert_eq!(report.completed_sets(), 3);
        assert!((report.completion_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_huge_window_covers_everything() {
        let store = MemoryStore::new();
        store.save_workout(&workout(50.0, &[true])).await.unwrap();

        for days in [100_000_000, i64::MAX] {
            let report = load_recent_workouts(&store, "u1", days).await.unwrap();
            assert_eq!(report.sessions.len(), 1);
            assert_eq!(report.days, days);
        }
    }

    #[tokio::test]
    async fn test_zero_and_negative_windows() {
        let store = MemoryStore::new();
        let mut old = workout(50.0, &[true]);
        old.ended_at = Utc::now() - Duration::days(2);
        store.save_workout(&old).await.unwrap();

        let report = load_recent_workouts(&store, "u1", 0).await.unwrap();
        assert!(report.sessions.is_empty());

        assert!(load_recent_workouts(&store, "u1", -1).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_report() {
        let store = MemoryStore::new();
        let report = load_recent_workouts(&store, "nobody", 7).await.unwrap();
        assert!(report.sessions.is_empty());
        assert_eq!(report.completion_rate(), 0.0);
    }
}
