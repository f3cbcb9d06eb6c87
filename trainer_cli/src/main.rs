use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use trainer_core::*;

#[derive(Parser)]
#[command(name = "trainer")]
#[command(about = "Sync AI Personal Trainer workouts with Hevy", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Push a stored workout to Hevy as a routine
    Push {
        /// Local workout id
        workout_id: String,
    },

    /// Show the routine that would be pushed, without contacting Hevy
    Preview {
        /// Local workout id
        workout_id: String,
    },

    /// Import workouts from a JSON file (an array of workouts)
    Import {
        file: PathBuf,
    },

    /// List stored workouts
    List,

    /// Pull recent workouts from Hevy into the local store
    Pull,

    /// Pull from Hevy, then push recent local workouts
    Sync,

    /// Drop superseded workout versions from the store file
    Compact,
}

fn main() -> Result<()> {
    trainer_core::logging::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let store = JsonlWorkoutStore::in_dir(&data_dir);
    tracing::debug!("Using workout store at {:?}", store.path());

    match cli.command {
        Commands::Push { workout_id } => cmd_push(store, &config, &workout_id),
        Commands::Preview { workout_id } => cmd_preview(&store, &workout_id),
        Commands::Import { file } => cmd_import(&store, &file),
        Commands::List => cmd_list(&store),
        Commands::Pull => cmd_pull(&store, &config),
        Commands::Sync => cmd_sync(store, &config),
        Commands::Compact => cmd_compact(&store),
    }
}

fn cmd_push(store: JsonlWorkoutStore, config: &Config, workout_id: &str) -> Result<()> {
    // Fail on unknown ids before requiring any remote credentials
    if store.get(workout_id)?.is_none() {
        return Err(Error::NotFound(workout_id.to_string()));
    }

    let client = HevyClient::from_config(&config.remote)?;
    let service = SyncService::new(store, client);
    let routine_id = service.push(workout_id)?;

    println!("✓ Pushed workout {} to Hevy", workout_id);
    println!("  Routine ID: {}", routine_id);
    Ok(())
}

fn cmd_preview(store: &JsonlWorkoutStore, workout_id: &str) -> Result<()> {
    let workout = store
        .get(workout_id)?
        .ok_or_else(|| Error::NotFound(workout_id.to_string()))?;

    let routine = map_workout_to_routine(&workout);
    println!("{}", serde_json::to_string_pretty(&routine)?);
    Ok(())
}

fn cmd_import(store: &JsonlWorkoutStore, file: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(file)?;
    let new_workouts: Vec<NewWorkout> = serde_json::from_str(&contents)?;

    let mut created = 0;
    let mut updated = 0;
    for new_workout in new_workouts {
        let workout = new_workout.into_workout();
        match store.upsert(&workout)? {
            UpsertOutcome::Created => created += 1,
            UpsertOutcome::Updated => updated += 1,
        }
        println!("  {}", workout.id);
    }

    println!("✓ Imported {} new, {} updated workouts", created, updated);
    Ok(())
}

fn cmd_list(store: &JsonlWorkoutStore) -> Result<()> {
    let workouts = store.list_all()?;
    if workouts.is_empty() {
        println!("No workouts stored.");
        return Ok(());
    }

    for workout in workouts {
        println!(
            "{}  {}  {} exercises",
            workout.id,
            workout.date.format("%Y-%m-%d %H:%M"),
            workout.exercises.len()
        );
    }
    Ok(())
}

fn cmd_pull(store: &JsonlWorkoutStore, config: &Config) -> Result<()> {
    let client = HevyClient::from_config(&config.remote)?;
    let report = pull_into_store(
        &client,
        store,
        config.sync.pull_window_days,
        config.sync.page_size,
        chrono::Utc::now(),
    );

    println!(
        "✓ Pulled {} workouts: {} new, {} updated, {} errors",
        report.fetched, report.created, report.updated, report.errors
    );
    Ok(())
}

fn cmd_sync(store: JsonlWorkoutStore, config: &Config) -> Result<()> {
    let client = HevyClient::from_config(&config.remote)?;
    let service = SyncService::new(store, client);
    let report = service.run_sync(&config.sync, chrono::Utc::now());

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.push_success {
        return Err(Error::Other(
            report
                .push_error
                .unwrap_or_else(|| "push phase failed".into()),
        ));
    }
    Ok(())
}

fn cmd_compact(store: &JsonlWorkoutStore) -> Result<()> {
    let kept = store.compact()?;
    println!("✓ Store compacted, {} workouts kept", kept);
    Ok(())
}
