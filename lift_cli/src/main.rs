use clap::{Parser, Subcommand};
use lift_core::*;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "lift")]
#[command(about = "Workout logger with sets, rest timer and history", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the workout in progress (default)
    Show,

    /// Search the exercise catalog
    Search {
        /// Text contained in the exercise name
        query: String,

        /// Pick a suggestion with up/down/enter/esc
        #[arg(long)]
        interactive: bool,
    },

    /// Choose the exercise for this workout by catalog id
    Select { id: String },

    /// Append a set copying the previous one
    AddSet,

    /// Delete a set
    RemoveSet { id: u32 },

    /// Change fields of a set
    UpdateSet {
        id: u32,

        #[arg(long)]
        reps: Option<u32>,

        #[arg(long)]
        weight: Option<f64>,

        #[arg(long)]
        notes: Option<String>,

        #[arg(long)]
        show_notes: Option<bool>,
    },

    /// Mark a set as done and start resting
    Complete { id: u32 },

    /// Mark a set as not done
    Undo { id: u32 },

    /// Rest countdown controls
    Rest {
        #[command(subcommand)]
        action: Option<RestAction>,
    },

    /// Save the workout and start a new one
    Save {
        /// Authenticated user id
        #[arg(long)]
        user: String,
    },

    /// Throw the workout in progress away
    Discard,

    /// Sessions saved over the last days
    History {
        #[arg(long)]
        user: String,

        #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(i64).range(0..))]
        days: i64,
    },
}

#[derive(Subcommand)]
enum RestAction {
    /// Show the remaining rest (default)
    Status,
    /// Count down live, one tick per second
    Watch,
    /// Stop resting now
    Skip,
    /// Add or remove seconds
    Adjust {
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },
    /// Start over from the configured rest duration
    Restart,
}

#[tokio::main]
async fn main() -> Result<()> {
    lift_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    let mut config = Config::load()?.with_env_overrides();
    config.validate()?;
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }

    match cli.command.unwrap_or(Commands::Show) {
        Commands::Show => cmd_show(&config),
        Commands::Search { query, interactive } => cmd_search(&config, &query, interactive).await,
        Commands::Select { id } => cmd_select(&config, &id).await,
        Commands::AddSet => modify(&config, |logger| {
            logger.add_set();
            Ok(())
        }),
        Commands::RemoveSet { id } => modify(&config, |logger| {
            require_set(logger, id)?;
            logger.remove_set(id);
            Ok(())
        }),
        Commands::UpdateSet {
            id,
            reps,
            weight,
            notes,
            show_notes,
        } => modify(&config, |logger| {
            require_set(logger, id)?;
            if let Some(reps) = reps {
                logger.update_set(id, SetUpdate::Reps(reps));
            }
            if let Some(weight) = weight {
                if !weight.is_finite() || weight < 0.0 {
                    return Err(Error::Other(format!("Invalid weight: {}", weight)));
                }
                logger.update_set(id, SetUpdate::Weight(weight));
            }
            if let Some(notes) = notes {
                logger.update_set(id, SetUpdate::Notes(notes));
            }
            if let Some(show) = show_notes {
                logger.update_set(id, SetUpdate::ShowNotes(show));
            }
            Ok(())
        }),
        Commands::Complete { id } => modify(&config, |logger| {
            require_set(logger, id)?;
            logger.complete_set(id);
            Ok(())
        }),
        Commands::Undo { id } => modify(&config, |logger| {
            require_set(logger, id)?;
            logger.undo_set(id);
            Ok(())
        }),
        Commands::Rest { action } => cmd_rest(&config, action.unwrap_or(RestAction::Status)).await,
        Commands::Save { user } => cmd_save(&config, &user).await,
        Commands::Discard => {
            let (_, ()) = WorkoutLogger::update(&config.state_path(), |logger| {
                logger.reset();
                Ok(())
            })?;
            println!("✓ Workout discarded");
            Ok(())
        }
        Commands::History { user, days } => cmd_history(&config, &user, days).await,
    }
}

/// Load state, apply one change, save it, and show the result
fn modify<F>(config: &Config, f: F) -> Result<()>
where
    F: FnOnce(&mut WorkoutLogger) -> Result<()>,
{
    let (logger, ()) = WorkoutLogger::update(&config.state_path(), f)?;
    display_logger(&logger);
    Ok(())
}

fn require_set(logger: &WorkoutLogger, id: u32) -> Result<()> {
    match logger.draft.set(id) {
        Some(_) => Ok(()),
        None => Err(Error::Other(format!("No set with id {}", id))),
    }
}

fn cmd_show(config: &Config) -> Result<()> {
    let logger = WorkoutLogger::load(&config.state_path())?;
    display_logger(&logger);
    Ok(())
}

async fn cmd_search(config: &Config, query: &str, interactive: bool) -> Result<()> {
    let store = open_store(config);
    let catalog = load_configured_catalog(config, store.as_ref()).await?;

    let mut logger = WorkoutLogger::load(&config.state_path())?;
    logger.set_exercise_input(query);

    let mut autocomplete = Autocomplete::new();
    autocomplete.update(&logger.draft.exercise_input, &catalog);

    if !autocomplete.is_visible() {
        println!("No exercises match \"{}\"", logger.draft.exercise_input);
        logger.save(&config.state_path())?;
        return Ok(());
    }

    display_suggestions(&autocomplete);

    if interactive {
        if let Some(exercise) = pick_suggestion(&mut autocomplete)? {
            logger.select_exercise(&exercise);
            println!("\n✓ Selected {}", exercise.name);
        }
    }

    logger.save(&config.state_path())?;
    Ok(())
}

/// Read navigation keys from stdin until a suggestion is chosen or dismissed
fn pick_suggestion(autocomplete: &mut Autocomplete) -> Result<Option<Exercise>> {
    println!("─────────────────────────────────────────");
    println!("'j' down, 'k' up, Enter to select, 'q' to dismiss");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            return Ok(None);
        }

        let key = match input.trim().to_lowercase().as_str() {
            "j" | "down" => Key::Down,
            "k" | "up" => Key::Up,
            "" | "enter" => Key::Enter,
            "q" | "esc" => Key::Escape,
            other => {
                println!("Unknown key '{}'", other);
                continue;
            }
        };

        if let Some(exercise) = autocomplete.handle_key(key) {
            return Ok(Some(exercise));
        }
        if !autocomplete.is_visible() {
            return Ok(None);
        }
        display_suggestions(autocomplete);
    }
}

async fn cmd_select(config: &Config, id: &str) -> Result<()> {
    let store = open_store(config);
    let catalog = load_configured_catalog(config, store.as_ref()).await?;

    let exercise = catalog
        .get(id)
        .ok_or_else(|| Error::Other(format!("Unknown exercise id '{}'", id)))?;

    modify(config, |logger| {
        logger.select_exercise(exercise);
        Ok(())
    })
}

async fn cmd_rest(config: &Config, action: RestAction) -> Result<()> {
    let state_path = config.state_path();

    match action {
        RestAction::Status => {
            let logger = WorkoutLogger::load(&state_path)?;
            display_rest(&logger);
        }
        RestAction::Skip => {
            let (logger, ()) = WorkoutLogger::update(&state_path, |logger| {
                logger.skip_rest();
                Ok(())
            })?;
            display_rest(&logger);
        }
        RestAction::Adjust { delta } => {
            let (logger, ()) = WorkoutLogger::update(&state_path, |logger| {
                logger.adjust_rest(delta);
                Ok(())
            })?;
            display_rest(&logger);
        }
        RestAction::Restart => {
            let seconds = config.rest.restart_seconds;
            let (logger, ()) = WorkoutLogger::update(&state_path, |logger| {
                logger.restart_rest(seconds);
                Ok(())
            })?;
            display_rest(&logger);
        }
        RestAction::Watch => {
            let mut logger = WorkoutLogger::load(&state_path)?;
            if !logger.timer.is_active {
                println!("Not resting");
                return Ok(());
            }

            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // First tick completes immediately
            interval.tick().await;
            loop {
                print!("\r  Rest {}  ", logger.timer.format());
                io::stdout().flush()?;

                interval.tick().await;
                // Other commands may edit the state between ticks
                let (fresh, expired) =
                    WorkoutLogger::update(&state_path, |logger| Ok(logger.tick()))?;
                if expired {
                    println!("\n\n✓ Rest over, next set!");
                    break;
                }
                if !fresh.timer.is_active {
                    println!("\n\nRest stopped");
                    break;
                }
                logger = fresh;
            }
        }
    }

    Ok(())
}

async fn cmd_save(config: &Config, user_id: &str) -> Result<()> {
    let state_path = config.state_path();
    let mut logger = WorkoutLogger::load(&state_path)?;
    let store = open_store(config);

    match logger.finish_workout(user_id, store.as_ref()).await {
        Ok(Some(saved)) => {
            logger.save(&state_path)?;
            println!("✓ Workout saved!");
            println!("  Session: {}", saved.session_id);
            println!("  Sets: {}", saved.set_ids.len());
            Ok(())
        }
        Ok(None) => {
            println!("Nothing to save: select an exercise and add at least one set.");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Failed to save workout for user {}: {}", user_id, e);
            eprintln!("Could not save your workout. Your sets are kept, please try again.");
            Err(e)
        }
    }
}

async fn cmd_history(config: &Config, user_id: &str, days: i64) -> Result<()> {
    let store = open_store(config);
    let report = load_recent_workouts(store.as_ref(), user_id, days).await?;

    if report.sessions.is_empty() {
        println!("No workouts in the last {} days.", days);
        return Ok(());
    }

    println!("Workouts in the last {} days:", days);
    for session in &report.sessions {
        println!(
            "  {}  {:<10} {:>3}/{:<3} sets  volume {:.1}",
            session.ended_at.format("%Y-%m-%d %H:%M"),
            session.exercise_id.as_deref().unwrap_or("-"),
            session.completed_sets,
            session.set_count,
            session.total_volume
        );
    }
    println!();
    println!("  Sessions: {}", report.sessions.len());
    println!("  Total volume: {:.1}", report.total_volume());
    println!("  Completed sets: {:.0}%", report.completion_rate() * 100.0);
    Ok(())
}

fn display_suggestions(autocomplete: &Autocomplete) {
    for (index, exercise) in autocomplete.suggestions().iter().enumerate() {
        let marker = if autocomplete.highlighted() == Some(index) {
            "→"
        } else {
            " "
        };
        println!(
            "{} [{}] {} ({})",
            marker, exercise.id, exercise.name, exercise.muscle_group
        );
    }
}

fn display_logger(logger: &WorkoutLogger) {
    let draft = &logger.draft;

    println!("\n╭─────────────────────────────────────────╮");
    match &draft.selected_exercise {
        Some(exercise) => println!("│  {} ({})", exercise.name, exercise.muscle_group),
        None if draft.exercise_input.is_empty() => println!("│  No exercise selected"),
        None => println!("│  Searching: {}", draft.exercise_input),
    }
    println!("╰─────────────────────────────────────────╯");
    println!();

    for (index, set) in draft.sets.iter().enumerate() {
        let check = if set.completed { "x" } else { " " };
        println!(
            "  [{}] #{} (id {})  {} kg × {}",
            check,
            index + 1,
            set.id,
            set.weight,
            set.reps
        );
        if let Some(notes) = set.notes.as_deref().filter(|_| set.show_notes) {
            println!("        {}", notes);
        }
    }
    if draft.sets.is_empty() {
        println!("  No sets");
    }

    println!();
    println!(
        "  Completed: {}/{}  Volume: {:.1}",
        draft.completed_count(),
        draft.sets.len(),
        draft.total_volume()
    );
    display_rest(logger);
}

fn display_rest(logger: &WorkoutLogger) {
    if logger.timer.is_active {
        println!("  Resting: {} left", logger.timer.format());
    } else if logger.draft.is_resting {
        println!("  Resting");
    } else {
        println!("  Not resting");
    }
}
