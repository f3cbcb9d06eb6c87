//! Pushing stored workouts to the remote service.
//!
//! [`SyncService::push`] is a single sequential chain: load the workout,
//! map it to a routine, submit it, read back the routine id. Failures are
//! returned to the caller untouched; retrying is the caller's decision.

use crate::client::{RemoteRoutineClient, RemoteWorkoutSource};
use crate::config::SyncConfig;
use crate::pull::{pull_into_store, PullReport};
use crate::store::{WorkoutRepository, WorkoutStore};
use crate::{map_workout_to_routine, Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Push one stored workout to the remote service as a routine
///
/// Returns the identifier the remote service assigned to the new routine.
/// Each call creates a new remote routine; nothing is deduplicated.
pub fn push_workout_to_remote<S, C>(store: &S, client: &C, workout_id: &str) -> Result<String>
where
    S: WorkoutStore + ?Sized,
    C: RemoteRoutineClient + ?Sized,
{
    let workout = store
        .get(workout_id)?
        .ok_or_else(|| Error::NotFound(workout_id.to_string()))?;

    let routine = map_workout_to_routine(&workout);
    tracing::debug!(
        "Mapped workout {} to routine '{}' with {} exercises",
        workout.id,
        routine.title,
        routine.exercises.len()
    );

    let response = client
        .create(&routine)
        .map_err(|e| Error::RemoteService {
            title: routine.title.clone(),
            source: Box::new(e),
        })?;

    let routine_id = extract_routine_id(&response)?;
    tracing::info!("Pushed workout {} as remote routine {}", workout.id, routine_id);
    Ok(routine_id)
}

/// Read the created routine's id from a remote response
fn extract_routine_id(response: &Value) -> Result<String> {
    match response.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        Some(other) => Err(Error::InvalidRemoteResponse(format!(
            "routine id has unexpected value {}",
            other
        ))),
        None => Err(Error::InvalidRemoteResponse(
            "response missing routine ID".into(),
        )),
    }
}

/// Outcome of a full pull-then-push run
#[derive(Clone, Debug, Serialize)]
pub struct SyncReport {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: f64,
    pub pull_success: bool,
    pub pull_error: Option<String>,
    pub pull: Option<PullReport>,
    pub push_success: bool,
    pub push_error: Option<String>,
    pub pushed_workouts: usize,
    pub failed_workouts: usize,
}

/// Workout synchronization with injected store and remote client
#[derive(Clone, Debug)]
pub struct SyncService<S, C> {
    store: S,
    client: C,
}

impl<S, C> SyncService<S, C> {
    pub fn new(store: S, client: C) -> Self {
        Self { store, client }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

impl<S: WorkoutStore, C: RemoteRoutineClient> SyncService<S, C> {
    /// Push one workout, returning the remote routine id
    pub fn push(&self, workout_id: &str) -> Result<String> {
        push_workout_to_remote(&self.store, &self.client, workout_id)
    }
}

impl<S, C> SyncService<S, C>
where
    S: WorkoutRepository,
    C: RemoteRoutineClient + RemoteWorkoutSource,
{
    /// Pull recent remote workouts, then push the recent local ones
    ///
    /// Pull problems are recorded in the report and never stop the push
    /// phase. Individual push failures are logged and counted.
    pub fn run_sync(&self, settings: &SyncConfig, now: DateTime<Utc>) -> SyncReport {
        let start_time = Utc::now();
        tracing::info!("Starting sync at {}", start_time.to_rfc3339());

        let pull = pull_into_store(
            &self.client,
            &self.store,
            settings.pull_window_days,
            settings.page_size,
            now,
        );
        let pull_error = (pull.errors > 0)
            .then(|| format!("{} remote workouts failed to import", pull.errors));

        let mut report = SyncReport {
            start_time,
            end_time: start_time,
            duration_seconds: 0.0,
            pull_success: pull_error.is_none(),
            pull_error,
            pull: Some(pull),
            push_success: false,
            push_error: None,
            pushed_workouts: 0,
            failed_workouts: 0,
        };

        match self.store.recent(settings.push_window_days, now) {
            Ok(workouts) => {
                for workout in &workouts {
                    match self.push(&workout.id) {
                        Ok(_) => report.pushed_workouts += 1,
                        Err(e) => {
                            report.failed_workouts += 1;
                            tracing::warn!("Failed to push workout {}: {}", workout.id, e);
                        }
                    }
                }
                report.push_success = true;
                tracing::info!(
                    "Push completed. Pushed {} workouts",
                    report.pushed_workouts
                );
            }
            Err(e) => {
                tracing::error!("Push phase failed: {}", e);
                report.push_error = Some(e.to_string());
            }
        }

        let end_time = Utc::now();
        report.end_time = end_time;
        report.duration_seconds = (end_time - start_time)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);

        tracing::info!(
            "Sync completed at {} (duration: {:.2}s)",
            end_time.to_rfc3339(),
            report.duration_seconds
        );

        report
    }
}
