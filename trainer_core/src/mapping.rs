//! Workout to remote routine mapping.
//!
//! Pure conversion from a stored [`Workout`] into the [`RemoteRoutine`]
//! payload expected by the remote service. No I/O happens here.

use crate::{Exercise, ExerciseSets, RemoteExercise, RemoteRoutine, SetDescriptor, Workout};

const TITLE_PREFIX: &str = "Workout from";
const NOTES_PREFIX: &str = "Imported workout from AI Personal Trainer on";

/// Build the remote routine for a workout
///
/// Exercise order is preserved one-to-one. Dates are formatted in the offset
/// the workout was recorded with.
pub fn map_workout_to_routine(workout: &Workout) -> RemoteRoutine {
    RemoteRoutine {
        title: format!("{} {}", TITLE_PREFIX, workout.date.format("%Y-%m-%d %H:%M")),
        exercises: workout.exercises.iter().map(map_exercise).collect(),
        notes: format!("{} {}", NOTES_PREFIX, workout.date.format("%Y-%m-%d")),
    }
}

fn map_exercise(exercise: &Exercise) -> RemoteExercise {
    RemoteExercise {
        name: exercise.display_name().to_string(),
        sets: expand_sets(&exercise.sets),
        notes: exercise.notes.clone(),
    }
}

/// Turn set data into the remote set list
///
/// Uniform sets become `count` copies. A non-positive weight counts as unknown
/// and is left off rather than sent as zero.
pub fn expand_sets(sets: &ExerciseSets) -> Vec<SetDescriptor> {
    match sets {
        ExerciseSets::Explicit(list) => list.clone(),
        ExerciseSets::Uniform {
            reps,
            count,
            weight,
        } => {
            let weight = weight.filter(|w| *w > 0.0);
            (0..*count)
                .map(|_| SetDescriptor {
                    reps: Some(*reps),
                    weight,
                })
                .collect()
        }
        ExerciseSets::Absent => Vec::new(),
    }
}
