//! Workout persistence in a JSON Lines file.
//!
//! Each upsert appends the full workout as one line. Readers keep the last
//! line for an id. All access is serialized through a sidecar lock file
//! (`workouts.jsonl.lock`): shared for reads, exclusive for upsert and
//! compact. The data file itself is replaced by compaction, so it cannot
//! carry the lock.

use crate::{Error, Result, Workout};
use chrono::{DateTime, Duration, Utc};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name of the workout log inside the data directory
pub const WORKOUTS_FILE: &str = "workouts.jsonl";

/// Suffix appended to the log path to name its lock file
const LOCK_SUFFIX: &str = ".lock";

/// Lookup of stored workouts by id
pub trait WorkoutStore {
    fn get(&self, workout_id: &str) -> Result<Option<Workout>>;
}

/// Writable workout storage used by pull and the sync run
pub trait WorkoutRepository: WorkoutStore {
    /// Insert or replace a workout
    fn upsert(&self, workout: &Workout) -> Result<UpsertOutcome>;

    /// Workouts dated within the last `days` days of `now`, newest first
    fn recent(&self, days: i64, now: DateTime<Utc>) -> Result<Vec<Workout>>;
}

/// Whether an upsert inserted a new workout or replaced an existing one
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// JSONL-backed workout store with file locking
#[derive(Clone, Debug)]
pub struct JsonlWorkoutStore {
    path: PathBuf,
}

impl JsonlWorkoutStore {
    /// Create a store backed by the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a store at the standard location inside `data_dir`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(WORKOUTS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the sidecar lock file
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(LOCK_SUFFIX);
        PathBuf::from(name)
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn open_lock(&self) -> Result<File> {
        self.ensure_parent_dir()?;
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(self.lock_path())?;
        Ok(file)
    }

    /// Insert or replace a workout
    pub fn upsert(&self, workout: &Workout) -> Result<UpsertOutcome> {
        let lock = self.open_lock()?;
        // Held across the existence check and the append
        lock.lock_exclusive()?;
        let result = self.append_unlocked(workout);
        lock.unlock()?;

        let outcome = result?;
        tracing::debug!("Upserted workout {} ({:?})", workout.id, outcome);
        Ok(outcome)
    }

    fn append_unlocked(&self, workout: &Workout) -> Result<UpsertOutcome> {
        let existed = self.read_unlocked()?.contains_key(&workout.id);
        let line = serde_json::to_string(workout)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = std::io::BufWriter::new(&file);
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        Ok(if existed {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Created
        })
    }

    /// Latest version of every stored workout, newest first
    pub fn list_all(&self) -> Result<Vec<Workout>> {
        Ok(sorted_newest_first(self.read_latest()?))
    }

    /// Workouts dated within the last `days` days of `now`, newest first
    pub fn recent(&self, days: i64, now: DateTime<Utc>) -> Result<Vec<Workout>> {
        let cutoff = now - Duration::days(days);
        let workouts: Vec<Workout> = self
            .list_all()?
            .into_iter()
            .filter(|w| w.date.with_timezone(&Utc) >= cutoff)
            .collect();

        tracing::debug!(
            "Found {} workouts from the last {} days",
            workouts.len(),
            days
        );
        Ok(workouts)
    }

    /// Rewrite the log keeping only the latest version of each workout
    ///
    /// Returns the number of workouts kept. Holds the exclusive lock from the
    /// read through the rename so no concurrent upsert is dropped.
    pub fn compact(&self) -> Result<usize> {
        if !self.path.exists() {
            return Ok(0);
        }

        let lock = self.open_lock()?;
        lock.lock_exclusive()?;
        let result = self.compact_unlocked();
        lock.unlock()?;

        let kept = result?;
        tracing::info!("Compacted workout store to {} workouts", kept);
        Ok(kept)
    }

    fn compact_unlocked(&self) -> Result<usize> {
        let workouts = sorted_newest_first(self.read_unlocked()?);

        let parent = self.path.parent().ok_or_else(|| {
            Error::Other(format!("Store path {:?} has no parent", self.path))
        })?;
        let temp = NamedTempFile::new_in(parent)?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            // Oldest first so replaying the log yields the same ordering
            for workout in workouts.iter().rev() {
                writer.write_all(serde_json::to_string(workout)?.as_bytes())?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(workouts.len())
    }

    fn read_latest(&self) -> Result<HashMap<String, Workout>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let lock = self.open_lock()?;
        lock.lock_shared()?;
        let result = self.read_unlocked();
        lock.unlock()?;
        result
    }

    /// Read the log without taking the lock; callers must hold it
    fn read_unlocked(&self) -> Result<HashMap<String, Workout>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };

        let mut contents = String::new();
        BufReader::new(file).read_to_string(&mut contents)?;
        Ok(parse_latest(&contents))
    }
}

impl WorkoutStore for JsonlWorkoutStore {
    fn get(&self, workout_id: &str) -> Result<Option<Workout>> {
        Ok(self.read_latest()?.remove(workout_id))
    }
}

impl WorkoutRepository for JsonlWorkoutStore {
    fn upsert(&self, workout: &Workout) -> Result<UpsertOutcome> {
        JsonlWorkoutStore::upsert(self, workout)
    }

    fn recent(&self, days: i64, now: DateTime<Utc>) -> Result<Vec<Workout>> {
        JsonlWorkoutStore::recent(self, days, now)
    }
}

fn sorted_newest_first(latest: HashMap<String, Workout>) -> Vec<Workout> {
    let mut workouts: Vec<Workout> = latest.into_values().collect();
    workouts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
    workouts
}

/// Parse log contents, keeping the last record per id
fn parse_latest(contents: &str) -> HashMap<String, Workout> {
    let mut latest = HashMap::new();

    for (line_num, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Workout>(line) {
            Ok(workout) => {
                latest.insert(workout.id.clone(), workout);
            }
            Err(e) => {
                tracing::warn!("Failed to parse workout at line {}: {}", line_num + 1, e);
                // Keep going, one bad line shouldn't hide the rest
            }
        }
    }

    latest
}
