//! Core domain types for workout synchronization.
//!
//! This module defines:
//! - Stored workouts and their exercises
//! - The two shapes set data can take (explicit list or uniform summary)
//! - The remote routine payload pushed to the fitness-tracking service

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Name used when an exercise has no usable name
pub const UNKNOWN_EXERCISE_NAME: &str = "Unknown Exercise";

// ============================================================================
// Set Types
// ============================================================================

/// A single set prescription
///
/// `reps` is always written, as `null` for sets without a rep count (timed
/// sets recorded by the remote service). Records pulled by earlier versions
/// store the weight as `weight_kg`; both spellings are read.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetDescriptor {
    #[serde(default)]
    pub reps: Option<u32>,
    #[serde(default, alias = "weight_kg", skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl SetDescriptor {
    pub fn reps(reps: u32) -> Self {
        Self {
            reps: Some(reps),
            weight: None,
        }
    }

    pub fn weighted(reps: u32, weight: f64) -> Self {
        Self {
            reps: Some(reps),
            weight: Some(weight),
        }
    }
}

/// Set data attached to an exercise
#[derive(Clone, Debug, PartialEq)]
pub enum ExerciseSets {
    /// Already structured sets, passed through as-is
    Explicit(Vec<SetDescriptor>),
    /// `count` identical sets of `reps`, optionally at `weight`
    Uniform {
        reps: u32,
        count: u32,
        weight: Option<f64>,
    },
    /// No set information recorded
    Absent,
}

// ============================================================================
// Workout Types
// ============================================================================

/// One exercise inside a workout
///
/// Stored records use a flat layout where `sets` is either a list of set
/// objects or a set count with sibling `reps`/`weight` keys.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "ExerciseRecord", into = "ExerciseRecord")]
pub struct Exercise {
    pub name: Option<String>,
    pub sets: ExerciseSets,
    pub notes: Option<String>,
}

impl Exercise {
    /// Name to display, falling back to the placeholder when missing or blank
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => UNKNOWN_EXERCISE_NAME,
        }
    }
}

/// Storage layout of an exercise
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct ExerciseRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sets: Option<SetsRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum SetsRecord {
    List(Vec<SetDescriptor>),
    Count(u32),
}

impl From<ExerciseRecord> for Exercise {
    fn from(record: ExerciseRecord) -> Self {
        let sets = match record.sets {
            Some(SetsRecord::List(list)) => ExerciseSets::Explicit(list),
            Some(SetsRecord::Count(count)) => ExerciseSets::Uniform {
                reps: record.reps.unwrap_or(1),
                count,
                weight: record.weight,
            },
            None => ExerciseSets::Absent,
        };

        Exercise {
            name: record.name,
            sets,
            notes: record.notes,
        }
    }
}

impl From<Exercise> for ExerciseRecord {
    fn from(exercise: Exercise) -> Self {
        let mut record = ExerciseRecord {
            name: exercise.name,
            notes: exercise.notes,
            ..Default::default()
        };

        match exercise.sets {
            ExerciseSets::Explicit(list) => record.sets = Some(SetsRecord::List(list)),
            ExerciseSets::Uniform {
                reps,
                count,
                weight,
            } => {
                record.sets = Some(SetsRecord::Count(count));
                record.reps = Some(reps);
                record.weight = weight;
            }
            ExerciseSets::Absent => {}
        }

        record
    }
}

/// A locally stored training session
///
/// The date keeps the offset it was recorded with so the session's calendar
/// day is the one the athlete saw.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    #[serde(deserialize_with = "deserialize_workout_date")]
    pub date: DateTime<FixedOffset>,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

/// A workout as supplied for import, before it has been assigned an id
#[derive(Clone, Debug, Deserialize)]
pub struct NewWorkout {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(deserialize_with = "deserialize_workout_date")]
    pub date: DateTime<FixedOffset>,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

impl NewWorkout {
    /// Convert into a stored workout, generating an id when none was given
    pub fn into_workout(self) -> Workout {
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Workout {
            id,
            date: self.date,
            exercises: self.exercises,
        }
    }
}

/// Accept RFC 3339 timestamps as well as naive `YYYY-MM-DDTHH:MM:SS` (read as UTC)
fn deserialize_workout_date<'de, D>(
    deserializer: D,
) -> std::result::Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_workout_date(&raw).map_err(serde::de::Error::custom)
}

/// Parse a workout timestamp in either RFC 3339 or naive ISO form
pub fn parse_workout_date(raw: &str) -> std::result::Result<DateTime<FixedOffset>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt);
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc().fixed_offset())
        .ok_or_else(|| format!("Invalid workout date: {}", raw))
}

// ============================================================================
// Remote Routine Types
// ============================================================================

/// Routine payload in the remote service's schema
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteRoutine {
    pub title: String,
    pub exercises: Vec<RemoteExercise>,
    pub notes: String,
}

/// One exercise inside a remote routine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteExercise {
    pub name: String,
    pub sets: Vec<SetDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
