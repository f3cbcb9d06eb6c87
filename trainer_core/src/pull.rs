//! Import of workouts recorded on the remote service.
//!
//! Remote workouts from a recent window are fetched page by page, converted
//! into local [`Workout`] records and upserted into the store.

use crate::client::RemoteWorkoutSource;
use crate::store::{UpsertOutcome, WorkoutRepository};
use crate::types::parse_workout_date;
use crate::{Error, Exercise, ExerciseSets, Result, SetDescriptor, Workout};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;

/// Name given to remote exercises without a template name
const UNKNOWN_REMOTE_EXERCISE: &str = "Unknown";

/// Counts from one pull run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PullReport {
    pub fetched: usize,
    pub created: usize,
    pub updated: usize,
    pub errors: usize,
}

/// Fetch remote workouts created within `window_days` of `now`
///
/// Pages are read newest first. Paging stops at an empty or short page, or at
/// the first workout older than the window. A failing page ends paging early
/// and keeps whatever was already fetched.
pub fn fetch_recent_remote_workouts<S>(
    source: &S,
    window_days: i64,
    page_size: u32,
    now: DateTime<Utc>,
) -> Vec<Value>
where
    S: RemoteWorkoutSource + ?Sized,
{
    let cutoff = now - Duration::days(window_days);
    let mut collected = Vec::new();
    let mut page = 1;

    loop {
        let response = match source.get_workouts(page, page_size) {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Error fetching remote workouts page {}: {}", page, e);
                break;
            }
        };

        let workouts = match response.get("workouts").and_then(Value::as_array) {
            Some(workouts) if !workouts.is_empty() => workouts,
            _ => break,
        };

        for workout in workouts {
            if let Some(created_at) = remote_created_at(workout) {
                if created_at < cutoff {
                    tracing::debug!("Reached workouts older than {} days", window_days);
                    return collected;
                }
            }
            collected.push(workout.clone());
        }

        if workouts.len() < page_size as usize {
            break;
        }
        page += 1;
    }

    collected
}

fn remote_created_at(workout: &Value) -> Option<DateTime<Utc>> {
    workout
        .get("created_at")
        .and_then(Value::as_str)
        .and_then(|raw| parse_workout_date(raw).ok())
        .map(|date| date.with_timezone(&Utc))
}

/// Convert a remote workout object into a local workout
pub fn transform_remote_workout(remote: &Value) -> Result<Workout> {
    let id = match remote.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => {
            return Err(Error::InvalidRemoteResponse(
                "remote workout is missing an id".into(),
            ))
        }
    };

    let raw_date = remote
        .get("created_at")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            Error::InvalidRemoteResponse(format!("remote workout {} has no created_at", id))
        })?;
    let date = parse_workout_date(raw_date).map_err(Error::InvalidRemoteResponse)?;

    let exercises = remote
        .get("exercises")
        .and_then(Value::as_array)
        .map(|list| list.iter().map(transform_remote_exercise).collect())
        .unwrap_or_default();

    Ok(Workout {
        id,
        date,
        exercises,
    })
}

fn transform_remote_exercise(exercise: &Value) -> Exercise {
    let name = exercise
        .pointer("/exercise_template/name")
        .or_else(|| exercise.get("title"))
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_REMOTE_EXERCISE)
        .to_string();

    let sets = exercise
        .get("sets")
        .and_then(Value::as_array)
        .map(|sets| sets.iter().map(transform_remote_set).collect())
        .unwrap_or_default();

    let notes = exercise
        .get("notes")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    Exercise {
        name: Some(name),
        sets: ExerciseSets::Explicit(sets),
        notes,
    }
}

/// Timed and distance sets come back with `reps: null`; those stay unknown
fn transform_remote_set(set: &Value) -> SetDescriptor {
    let reps = set
        .get("reps")
        .and_then(Value::as_u64)
        .map(|r| u32::try_from(r).unwrap_or(u32::MAX));

    let weight = set
        .get("weight_kg")
        .or_else(|| set.get("weight"))
        .and_then(Value::as_f64);

    SetDescriptor { reps, weight }
}

/// Pull recent remote workouts into the local store
///
/// Individual workouts that fail to convert or save are counted as errors
/// and do not stop the run.
pub fn pull_into_store<S, R>(
    source: &S,
    store: &R,
    window_days: i64,
    page_size: u32,
    now: DateTime<Utc>,
) -> PullReport
where
    S: RemoteWorkoutSource + ?Sized,
    R: WorkoutRepository + ?Sized,
{
    let remote_workouts = fetch_recent_remote_workouts(source, window_days, page_size, now);
    tracing::info!("Fetched {} workouts from remote service", remote_workouts.len());

    let mut report = PullReport {
        fetched: remote_workouts.len(),
        ..Default::default()
    };

    for remote in &remote_workouts {
        let outcome = transform_remote_workout(remote).and_then(|w| store.upsert(&w));
        match outcome {
            Ok(UpsertOutcome::Created) => report.created += 1,
            Ok(UpsertOutcome::Updated) => report.updated += 1,
            Err(e) => {
                report.errors += 1;
                tracing::warn!("Failed to import remote workout: {}", e);
            }
        }
    }

    tracing::info!(
        "Pull completed: {} new workouts, {} updated workouts, {} errors",
        report.created,
        report.updated,
        report.errors
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{JsonlWorkoutStore, WorkoutStore};
    use chrono::TimeZone;
    use serde_json::json;
    use std::cell::RefCell;

    /// Serves canned pages and records which pages were requested
    struct FakeSource {
        pages: Vec<Result<Value>>,
        requested: RefCell<Vec<u32>>,
    }

    impl FakeSource {
        fn new(pages: Vec<Result<Value>>) -> Self {
            Self {
                pages,
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl RemoteWorkoutSource for FakeSource {
        fn get_workouts(&self, page: u32, _page_size: u32) -> Result<Value> {
            self.requested.borrow_mut().push(page);
            match self.pages.get(page as usize - 1) {
                Some(Ok(value)) => Ok(value.clone()),
                Some(Err(e)) => Err(Error::Other(e.to_string())),
                None => Ok(json!({ "workouts": [] })),
            }
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap()
    }

    fn remote_workout(id: &str, created_at: &str) -> Value {
        json!({
            "id": id,
            "created_at": created_at,
            "exercises": [{
                "exercise_template": { "name": "Bench Press" },
                "sets": [
                    { "reps": 5, "weight_kg": 100.0 },
                    { "reps": 5, "weight_kg": null }
                ],
                "notes": "felt strong"
            }]
        })
    }

    #[test]
    fn test_transform_remote_workout() {
        let workout =
            transform_remote_workout(&remote_workout("r1", "2024-03-10T09:00:00Z")).unwrap();

        assert_eq!(workout.id, "r1");
        assert_eq!(
            workout.date,
            Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap()
        );
        assert_eq!(workout.date.offset().local_minus_utc(), 0);

        let exercise = &workout.exercises[0];
        assert_eq!(exercise.name.as_deref(), Some("Bench Press"));
        assert_eq!(exercise.notes.as_deref(), Some("felt strong"));
        assert_eq!(
            exercise.sets,
            ExerciseSets::Explicit(vec![
                SetDescriptor::weighted(5, 100.0),
                SetDescriptor::reps(5),
            ])
        );
    }

    #[test]
    fn test_transform_defaults() {
        let remote = json!({
            "id": 42,
            "created_at": "2024-03-10T09:00:00Z",
            "exercises": [{ "sets": [{ "reps": null }], "notes": "" }]
        });

        let workout = transform_remote_workout(&remote).unwrap();
        assert_eq!(workout.id, "42");

        let exercise = &workout.exercises[0];
        assert_eq!(exercise.name.as_deref(), Some("Unknown"));
        assert!(exercise.notes.is_none());
        assert_eq!(
            exercise.sets,
            ExerciseSets::Explicit(vec![SetDescriptor {
                reps: None,
                weight: None,
            }])
        );
    }

    #[test]
    fn test_transform_requires_id_and_date() {
        let no_id = json!({ "created_at": "2024-03-10T09:00:00Z" });
        assert!(matches!(
            transform_remote_workout(&no_id),
            Err(Error::InvalidRemoteResponse(_))
        ));

        let no_date = json!({ "id": "r1" });
        assert!(matches!(
            transform_remote_workout(&no_date),
            Err(Error::InvalidRemoteResponse(_))
        ));
    }

    #[test]
    fn test_fetch_paginates_until_short_page() {
        let source = FakeSource::new(vec![
            Ok(json!({ "workouts": [
                remote_workout("a", "2024-03-30T09:00:00Z"),
                remote_workout("b", "2024-03-29T09:00:00Z"),
            ]})),
            Ok(json!({ "workouts": [remote_workout("c", "2024-03-28T09:00:00Z")] })),
        ]);

        let workouts = fetch_recent_remote_workouts(&source, 30, 2, now());

        assert_eq!(workouts.len(), 3);
        assert_eq!(*source.requested.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_fetch_stops_at_window_edge() {
        let source = FakeSource::new(vec![
            Ok(json!({ "workouts": [
                remote_workout("a", "2024-03-30T09:00:00Z"),
                remote_workout("old", "2024-01-01T09:00:00Z"),
            ]})),
            Ok(json!({ "workouts": [remote_workout("older", "2023-12-01T09:00:00Z")] })),
        ]);

        let workouts = fetch_recent_remote_workouts(&source, 30, 2, now());

        assert_eq!(workouts.len(), 1);
        assert_eq!(workouts[0]["id"], "a");
        assert_eq!(*source.requested.borrow(), vec![1]);
    }

    #[test]
    fn test_fetch_keeps_pages_before_error() {
        let source = FakeSource::new(vec![
            Ok(json!({ "workouts": [remote_workout("a", "2024-03-30T09:00:00Z")] })),
            Err(Error::Other("boom".into())),
        ]);

        let workouts = fetch_recent_remote_workouts(&source, 30, 1, now());
        assert_eq!(workouts.len(), 1);
    }

    #[test]
    fn test_pull_into_store_counts_outcomes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonlWorkoutStore::in_dir(temp_dir.path());
        store
            .upsert(&transform_remote_workout(&remote_workout("b", "2024-03-29T09:00:00Z")).unwrap())
            .unwrap();

        let source = FakeSource::new(vec![Ok(json!({ "workouts": [
            remote_workout("a", "2024-03-30T09:00:00Z"),
            remote_workout("b", "2024-03-29T09:00:00Z"),
            { "id": "broken" },
        ]}))]);

        let report = pull_into_store(&source, &store, 30, 50, now());

        assert_eq!(
            report,
            PullReport {
                fetched: 3,
                created: 1,
                updated: 1,
                errors: 1,
            }
        );
        assert_eq!(store.list_all().unwrap().len(), 2);
    }

    #[test]
    fn test_timed_sets_survive_pull_and_reload() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonlWorkoutStore::in_dir(temp_dir.path());

        let source = FakeSource::new(vec![Ok(json!({ "workouts": [{
            "id": "timed",
            "created_at": "2024-03-30T09:00:00Z",
            "exercises": [{
                "exercise_template": { "name": "Plank" },
                "sets": [{ "index": 0, "set_type": "normal", "weight_kg": null, "reps": null, "duration_seconds": 60 }]
            }]
        }]}))]);

        let report = pull_into_store(&source, &store, 30, 50, now());
        assert_eq!(report.created, 1);

        let workout = store.get("timed").unwrap().unwrap();
        assert_eq!(
            workout.exercises[0].sets,
            ExerciseSets::Explicit(vec![SetDescriptor {
                reps: None,
                weight: None,
            }])
        );
    }

    #[test]
    fn test_fetch_compares_offset_timestamps_in_utc() {
        // 2024-03-01T13:00+02:00 is 11:00 UTC, before the 30 day cutoff at 12:00 UTC
        let source = FakeSource::new(vec![Ok(json!({ "workouts": [
            remote_workout("inside", "2024-03-01T14:30:00+02:00"),
            remote_workout("outside", "2024-03-01T13:00:00+02:00"),
        ]}))]);

        let workouts = fetch_recent_remote_workouts(&source, 30, 50, now());

        assert_eq!(workouts.len(), 1);
        assert_eq!(workouts[0]["id"], "inside");
    }
}
