#![forbid(unsafe_code)]

//! Core domain model and synchronization logic for the AI Personal Trainer.
//!
//! This crate provides:
//! - Domain types (workouts, exercises, remote routines)
//! - Workout persistence (JSONL store)
//! - Workout-to-routine mapping
//! - Remote service client (Hevy)
//! - Push, pull and combined sync operations

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod store;
pub mod mapping;
pub mod client;
pub mod pull;
pub mod sync;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use store::{JsonlWorkoutStore, UpsertOutcome, WorkoutRepository, WorkoutStore};
pub use mapping::map_workout_to_routine;
pub use client::{HevyClient, RemoteRoutineClient, RemoteWorkoutSource};
pub use pull::{pull_into_store, PullReport};
pub use sync::{push_workout_to_remote, SyncReport, SyncService};
