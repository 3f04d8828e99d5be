//! PostgreSQL workout storage.
//!
//! The schema is owned by the hosted database; this module only issues
//! parameterized statements against `workout_sessions`, `workout_logs`,
//! `sets` and `exercises`. Generated ids travel as text and are matched
//! back with `id::text`, so the key column types are not assumed here. A
//! log whose exercise id is missing from `exercises` inserts no row and the
//! whole save rolls back. Exercise instructions are read through `to_jsonb`,
//! so either an array column or a single text column works.

use super::WorkoutStore;
use crate::types::{Catalog, CompletedWorkout, Exercise, SavedWorkout, WorkoutSummary};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::future::Future;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Deadline applied to each individual round-trip unless configured otherwise
pub const DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 15;

/// Workout storage backed by a single cached Postgres connection
pub struct PostgresStore {
    database_url: String,
    statement_timeout: Duration,
    pool: OnceCell<PgPool>,
}

impl PostgresStore {
    /// Create a store; no connection is made until the first query
    pub fn new(database_url: impl Into<String>, statement_timeout_secs: u64) -> Self {
        Self {
            database_url: database_url.into(),
            statement_timeout: Duration::from_secs(statement_timeout_secs),
            pool: OnceCell::new(),
        }
    }

    async fn pool(&self) -> Result<&PgPool> {
        self.pool
            .get_or_try_init(|| async {
                tracing::info!("Connecting to workout database");
                self.bounded(
                    PgPoolOptions::new()
                        .max_connections(1)
                        .connect(&self.database_url),
                )
                .await
            })
            .await
    }

    /// Run one round-trip under the statement deadline.
    ///
    /// On timeout the caller stops waiting; the server may still finish the work.
    async fn bounded<T, F>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.statement_timeout, operation).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(Error::Timeout(self.statement_timeout.as_secs())),
        }
    }
}

fn to_i32(value: u32, field: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| Error::Other(format!("{} out of range: {}", field, value)))
}

#[async_trait]
impl WorkoutStore for PostgresStore {
    async fn save_workout(&self, workout: &CompletedWorkout) -> Result<SavedWorkout> {
        let pool = self.pool().await?;
        let mut tx = self.bounded(pool.begin()).await?;

        let session_id: String = self
            .bounded(
                sqlx::query_scalar(
                    r#"
                    INSERT INTO workout_sessions (user_id, start_time, end_time, total_volume)
                    VALUES ($1, $2, $2, $3)
                    RETURNING id::text
                    "#,
                )
                .bind(&workout.user_id)
                .bind(workout.ended_at)
                .bind(workout.total_volume)
                .fetch_one(&mut *tx),
            )
            .await?;
        tracing::debug!("Inserted workout session {}", session_id);

        let log_id: String = self
            .bounded(
                sqlx::query_scalar(
                    r#"
                    INSERT INTO workout_logs (session_id, exercise_id)
                    SELECT s.id, e.id
                    FROM workout_sessions s, exercises e
                    WHERE s.id::text = $1 AND e.id::text = $2
                    RETURNING id::text
                    "#,
                )
                .bind(&session_id)
                .bind(&workout.exercise_id)
                .fetch_one(&mut *tx),
            )
            .await?;
        tracing::debug!("Inserted workout log {}", log_id);

        let mut set_ids = Vec::with_capacity(workout.sets.len());
        for set in &workout.sets {
            let set_id: String = self
                .bounded(
                    sqlx::query_scalar(
                        r#"
                        INSERT INTO sets (log_id, weight, reps, "order", completed)
                        SELECT l.id, $2, $3, $4, $5
                        FROM workout_logs l
                        WHERE l.id::text = $1
                        RETURNING id::text
                        "#,
                    )
                    .bind(&log_id)
                    .bind(set.weight)
                    .bind(to_i32(set.reps, "reps")?)
                    .bind(to_i32(set.order, "order")?)
                    .bind(set.completed)
                    .fetch_one(&mut *tx),
                )
                .await?;
            set_ids.push(set_id);
        }
        tracing::debug!("Inserted {} sets for log {}", set_ids.len(), log_id);

        self.bounded(tx.commit()).await?;
        tracing::info!(
            "Saved workout session {} ({} sets, volume {})",
            session_id,
            set_ids.len(),
            workout.total_volume
        );

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
        let pool = self.pool().await?;
        let rows = self
            .bounded(
                sqlx::query(
                    r#"
                    SELECT s.id::text AS session_id,
                           s.end_time,
                           s.total_volume::float8 AS total_volume,
                           MIN(l.exercise_id::text) AS exercise_id,
                           COUNT(st.id) AS set_count,
                           COUNT(st.id) FILTER (WHERE st.completed) AS completed_sets
                    FROM workout_sessions s
                    LEFT JOIN workout_logs l ON l.session_id = s.id
                    LEFT JOIN sets st ON st.log_id = l.id
                    WHERE s.user_id::text = $1 AND s.end_time >= $2
                    GROUP BY s.id, s.end_time, s.total_volume
                    ORDER BY s.end_time DESC
                    "#,
                )
                .bind(user_id)
                .bind(since)
                .fetch_all(pool),
            )
            .await?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            let set_count: i64 = row.try_get("set_count")?;
            let completed_sets: i64 = row.try_get("completed_sets")?;
            summaries.push(WorkoutSummary {
                session_id: row.try_get("session_id")?,
                ended_at: row.try_get("end_time")?,
                total_volume: row.try_get("total_volume")?,
                exercise_id: row.try_get("exercise_id")?,
                set_count: u32::try_from(set_count).unwrap_or(u32::MAX),
                completed_sets: u32::try_from(completed_sets).unwrap_or(u32::MAX),
            });
        }

        tracing::debug!("Read {} sessions for user {}", summaries.len(), user_id);
        Ok(summaries)
    }

    async fn load_exercises(&self) -> Result<Option<Catalog>> {
        let pool = self.pool().await?;
        let rows = self
            .bounded(
                sqlx::query(
                    r#"
                    SELECT id::text AS id, name, muscle_group, equipment, difficulty,
                           image_url, description,
                           COALESCE(to_jsonb(instructions), '[]'::jsonb)::text AS instructions
                    FROM exercises
                    ORDER BY name
                    "#,
                )
                .fetch_all(pool),
            )
            .await?;

        let mut exercises = Vec::with_capacity(rows.len());
        for row in rows {
            exercises.push(Exercise {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                muscle_group: row.try_get("muscle_group")?,
                equipment: row.try_get("equipment")?,
                difficulty: row.try_get("difficulty")?,
                image_url: row.try_get("image_url")?,
                description: row.try_get("description")?,
                instructions: parse_instructions(row.try_get::<&str, _>("instructions")?),
            });
        }

        tracing::info!("Loaded {} exercises from database", exercises.len());
        Ok(Some(Catalog { exercises }))
    }
}

/// Instructions arrive as JSON: an array of steps, or one text with a step per line
fn parse_instructions(raw: &str) -> Vec<String> {
    let steps = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(step) => Some(step),
                serde_json::Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Ok(serde_json::Value::String(text)) => text.lines().map(str::to_owned).collect(),
        Ok(serde_json::Value::Null) => Vec::new(),
        Ok(other) => {
            tracing::warn!("Unexpected exercise instructions: {}", other);
            Vec::new()
        }
        Err(e) => {
            tracing::warn!("Unreadable exercise instructions: {}", e);
            Vec::new()
        }
    };
    steps
        .into_iter()
        .map(|step: String| step.trim().to_owned())
        .filter(|step| !step.is_empty())
        .collect()
}
