//! setlog - Workout set log with personal records and progression targets

use anyhow::{Context, Result, bail};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, Offset, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use setlog::analytics::days::local_date;
use setlog::analytics::{Baseline, BestDay, DaySummary, NextSessionTargets, ProgressComparison, SessionSummary};
use setlog::engine::PrObserver;
use setlog::exercises::{Exercise, NewExercise};
use setlog::sets::{NewSet, SetEdit, WorkoutSet};
use setlog::{Database, Engine};

#[derive(Parser)]
#[command(name = "setlog")]
#[command(author, version, about = "Workout set log with personal records and progression targets")]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "SETLOG_DB", default_value = "setlog.db", global = true)]
    db: String,

    /// Minutes east of UTC used for day boundaries (default: host offset)
    #[arg(long, env = "SETLOG_UTC_OFFSET", allow_hyphen_values = true, global = true)]
    utc_offset: Option<i32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage exercises
    Exercise {
        #[command(subcommand)]
        command: ExerciseCommands,
    },

    /// Log a set
    Log {
        /// Exercise name
        exercise: String,

        /// Weight in kg, 0 for bodyweight
        #[arg(short, long, default_value = "0")]
        weight: f64,

        #[arg(short, long, default_value = "0")]
        reps: u32,

        #[arg(long)]
        warm_up: bool,

        #[arg(long)]
        bonus: bool,

        #[arg(long)]
        drop_set: bool,

        #[arg(long)]
        assisted: bool,

        #[arg(long)]
        pause_at_top: bool,

        /// Timed set, seconds under tension
        #[arg(long)]
        tempo: Option<u32>,

        /// When the set was done (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Edit a logged set
    Edit {
        set_id: i64,

        #[arg(short, long)]
        weight: Option<f64>,

        #[arg(short, long)]
        reps: Option<u32>,

        #[arg(long)]
        drop_set: Option<bool>,

        #[arg(long)]
        assisted: Option<bool>,

        #[arg(long)]
        pause_at_top: Option<bool>,

        /// Make the set timed with this tempo
        #[arg(long, conflicts_with = "untimed")]
        tempo: Option<u32>,

        /// Make the set untimed
        #[arg(long)]
        untimed: bool,
    },

    /// Toggle the warm-up flag of a set
    Warmup { set_id: i64 },

    /// Toggle the bonus flag of a set
    Bonus { set_id: i64 },

    /// Delete a set
    Delete { set_id: i64 },

    /// Rest timer ran out for a set
    RestExpired { set_id: i64 },

    /// Today, last session, progress, record and next targets
    Stats {
        exercise: String,

        #[arg(long)]
        json: bool,
    },

    /// Day by day history, newest first
    History {
        exercise: String,

        /// Number of days to show
        #[arg(short, long, default_value = "10")]
        limit: usize,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ExerciseCommands {
    /// Add an exercise
    Add {
        name: String,

        #[arg(short, long = "tag")]
        tags: Vec<String>,

        #[arg(short, long)]
        note: Option<String>,
    },

    /// List exercises
    List {
        /// Only exercises with this tag
        #[arg(short, long)]
        tag: Option<String>,
    },

    /// Delete an exercise with all its sets
    Delete { name: String },

    /// Add or remove tags
    Tag {
        name: String,

        tags: Vec<String>,

        #[arg(long)]
        remove: bool,
    },
}

/// Prints a line whenever a logged set takes the record
struct Announcer;

impl PrObserver for Announcer {
    fn on_personal_record(&self, exercise: &Exercise, set: &WorkoutSet) {
        println!("New personal record on {}: {}", exercise.name, describe_load(set));
    }
}

#[derive(Serialize)]
struct StatsReport<'a> {
    exercise: &'a Exercise,
    today: SessionSummary,
    last_session: Option<SessionSummary>,
    progress: ProgressComparison,
    personal_record: Option<&'a WorkoutSet>,
    best_day: Option<BestDay>,
    baseline: Baseline<'a>,
    targets: Option<NextSessionTargets>,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let tz = timezone(cli.utc_offset)?;
    let db = Database::open(&cli.db).with_context(|| format!("Failed to open database {}", cli.db))?;

    let mut engine = Engine::new(db, tz);
    engine.add_observer(Box::new(Announcer));

    match cli.command {
        Commands::Exercise { command } => exercise_command(&mut engine, command)?,

        Commands::Log {
            exercise,
            weight,
            reps,
            warm_up,
            bonus,
            drop_set,
            assisted,
            pause_at_top,
            tempo,
            at,
        } => {
            let exercise = resolve(&engine, &exercise)?;
            let new = NewSet {
                weight,
                reps,
                timestamp: at.unwrap_or_else(Utc::now),
                is_warm_up: warm_up,
                is_bonus: bonus,
                is_drop_set: drop_set,
                is_assisted: assisted,
                is_pause_at_top: pause_at_top,
                tempo_seconds: tempo,
            };
            let outcome = engine
                .add_set(exercise.id, new)
                .with_context(|| format!("Failed to log set for {}", exercise.name))?;
            println!(
                "Logged: {} - {} (id: {})",
                exercise.name,
                describe_load(&outcome.set),
                outcome.set.id.unwrap_or_default()
            );
        }

        Commands::Edit {
            set_id,
            weight,
            reps,
            drop_set,
            assisted,
            pause_at_top,
            tempo,
            untimed,
        } => {
            let edit = SetEdit {
                weight,
                reps,
                is_drop_set: drop_set,
                is_assisted: assisted,
                is_pause_at_top: pause_at_top,
                is_timed_set: untimed.then_some(false),
                tempo_seconds: tempo,
                ..Default::default()
            };
            let set = engine
                .edit_set(set_id, &edit)
                .with_context(|| format!("Failed to edit set {}", set_id))?;
            println!("Updated set {}: {}", set_id, describe_set(&set));
        }

        Commands::Warmup { set_id } => {
            let set = engine.toggle_warm_up(set_id)?;
            println!("Set {} warm-up: {}", set_id, if set.is_warm_up { "yes" } else { "no" });
        }

        Commands::Bonus { set_id } => {
            let set = engine.toggle_bonus(set_id)?;
            println!("Set {} bonus: {}", set_id, if set.is_bonus { "yes" } else { "no" });
        }

        Commands::Delete { set_id } => {
            let set = engine.delete_set(set_id)?;
            println!("Deleted set {}: {}", set_id, describe_load(&set));
        }

        Commands::RestExpired { set_id } => {
            let set = engine.expire_rest_timer(set_id)?;
            println!("Set {} rest: {}s", set_id, set.rest_seconds.unwrap_or_default());
        }

        Commands::Stats { exercise, json } => {
            let exercise = resolve(&engine, &exercise)?;
            let analytics = engine.analytics(exercise.id)?;
            let today = today(&tz);

            let report = StatsReport {
                exercise: &exercise,
                today: analytics.today(today),
                last_session: analytics.last_session(today),
                progress: analytics.progress(today),
                personal_record: analytics.personal_record(),
                best_day: analytics.best_day(),
                baseline: analytics.baseline(today),
                targets: analytics.targets(today),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_stats(&report, &tz);
            }
        }

        Commands::History { exercise, limit, json } => {
            let exercise = resolve(&engine, &exercise)?;
            let days: Vec<DaySummary> = engine
                .analytics(exercise.id)?
                .history()
                .into_iter()
                .take(limit)
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&days)?);
            } else {
                println!("History: {}", exercise.name);
                println!("{:-<64}", "");
                for day in &days {
                    println!(
                        "{} | {:>2} sets | {:>8.1} kg vol | max {:>6.1} x {:<3} | {}{}",
                        day.date,
                        day.metrics.set_count,
                        day.metrics.volume,
                        day.metrics.max_weight,
                        day.metrics.max_weight_reps,
                        day.quality,
                        if day.holds_record { " | PR" } else { "" }
                    );
                }
            }
        }
    }

    Ok(())
}

fn exercise_command(engine: &mut Engine<Database>, command: ExerciseCommands) -> Result<()> {
    match command {
        ExerciseCommands::Add { name, tags, note } => {
            let mut new = NewExercise::new(name).with_tags(&tags);
            if let Some(note) = note {
                new = new.with_note(note);
            }
            let exercise = engine.create_exercise(new)?;
            println!("Added: {} (id: {})", exercise.name, exercise.id);
        }

        ExerciseCommands::List { tag } => {
            let exercises = engine.exercises()?;
            println!("Exercises:");
            println!("{:-<40}", "");
            for e in exercises
                .iter()
                .filter(|e| tag.as_deref().is_none_or(|t| e.has_tag(t)))
            {
                let tags: Vec<&str> = e.tags.iter().map(String::as_str).collect();
                println!("{:>4} | {:20} | {}", e.id, e.name, tags.join(", "));
            }
        }

        ExerciseCommands::Delete { name } => {
            let exercise = resolve(engine, &name)?;
            engine.delete_exercise(exercise.id)?;
            println!("Deleted: {}", exercise.name);
        }

        ExerciseCommands::Tag { name, tags, remove } => {
            if tags.is_empty() {
                bail!("No tags given");
            }
            let exercise = resolve(engine, &name)?;
            let exercise = if remove {
                engine.untag_exercise(exercise.id, &tags)?
            } else {
                engine.tag_exercise(exercise.id, &tags)?
            };
            let tags: Vec<&str> = exercise.tags.iter().map(String::as_str).collect();
            println!("{}: {}", exercise.name, tags.join(", "));
        }
    }
    Ok(())
}

fn resolve(engine: &Engine<Database>, name: &str) -> Result<Exercise> {
    engine
        .find_exercise(name)?
        .with_context(|| format!("Unknown exercise: {}", name))
}

fn timezone(offset_minutes: Option<i32>) -> Result<FixedOffset> {
    match offset_minutes {
        Some(minutes) => FixedOffset::east_opt(minutes * 60)
            .with_context(|| format!("UTC offset out of range: {} minutes", minutes)),
        None => Ok(Local::now().offset().fix()),
    }
}

fn today(tz: &FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(tz).date_naive()
}

fn describe_load(set: &WorkoutSet) -> String {
    match (set.has_weight(), set.has_reps()) {
        (true, true) => format!("{} kg x {}", set.weight, set.reps),
        (true, false) => format!("{} kg", set.weight),
        _ => format!("{} reps", set.reps),
    }
}

/// Record load and the local day it was lifted on
fn describe_record(set: &WorkoutSet, tz: &FixedOffset) -> String {
    format!("{} on {}", describe_load(set), local_date(&set.timestamp, tz))
}

fn describe_set(set: &WorkoutSet) -> String {
    let mut flags = Vec::new();
    if set.is_warm_up {
        flags.push("warm-up");
    }
    if set.is_bonus {
        flags.push("bonus");
    }
    if set.is_drop_set {
        flags.push("drop");
    }
    if set.is_assisted {
        flags.push("assisted");
    }
    if set.is_pause_at_top {
        flags.push("pause");
    }
    if set.is_pb {
        flags.push("PR");
    }

    let mut text = describe_load(set);
    if let Some(tempo) = set.tempo_seconds {
        text.push_str(&format!(" ({}s)", tempo));
    }
    if !flags.is_empty() {
        text.push_str(&format!(" [{}]", flags.join(", ")));
    }
    text
}

fn print_stats(report: &StatsReport<'_>, tz: &FixedOffset) {
    println!("Exercise: {}", report.exercise.name);
    println!("{:-<40}", "");

    let today = &report.today.metrics;
    println!(
        "Today: {} sets, {:.1} kg volume, {} reps",
        today.set_count, today.volume, today.total_reps
    );

    match &report.last_session {
        Some(last) => println!(
            "Last session ({}): {} sets, {:.1} kg volume, {} reps",
            last.date, last.metrics.set_count, last.metrics.volume, last.metrics.total_reps
        ),
        None => println!("Last session: -"),
    }

    let p = &report.progress;
    if p.can_compare {
        println!(
            "Progress: {}% ({:+}%) volume {} max {} reps {}",
            p.percentage,
            p.gains_percent,
            p.volume.arrow(),
            p.max_weight.arrow(),
            p.total_reps.arrow()
        );
    } else {
        println!("Progress: not comparable");
    }

    match report.personal_record {
        Some(set) => println!("Personal record: {}", describe_record(set, tz)),
        None => println!("Personal record: -"),
    }

    if let Some(best) = &report.best_day {
        println!("Best day: {} ({:.1} kg volume, {} reps)", best.date, best.metrics.volume, best.metrics.total_reps);
    }

    println!();
    match &report.targets {
        Some(next) => {
            println!("Next session (based on {})", next.baseline_date);
            if let Some(warning) = &next.warning {
                println!("  ! {}", warning);
            }
            let t = &next.targets;
            for plan in [&t.rep_plan, &t.weight_plan] {
                let marker = if plan.path == t.recommended { "*" } else { " " };
                let reps: Vec<String> = plan.reps.iter().map(|r| r.to_string()).collect();
                println!(
                    " {} {:<10} {} kg x [{}] = {:.1} kg",
                    marker,
                    plan.path.to_string(),
                    plan.weight,
                    reps.join(", "),
                    plan.volume()
                );
            }
        }
        None => println!("Next session: log a few sessions first"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn create_set(weight: f64, reps: u32, ts: DateTime<Utc>) -> WorkoutSet {
        NewSet::new(weight, reps, ts).into_set(1).unwrap()
    }

    #[test]
    fn test_record_date_uses_local_day() {
        // 22:30 UTC on the 1st is the 2nd at UTC+3
        let set = create_set(100.0, 5, Utc.with_ymd_and_hms(2026, 3, 1, 22, 30, 0).unwrap());
        let moscow = timezone(Some(180)).unwrap();
        let utc = timezone(Some(0)).unwrap();

        assert_eq!(describe_record(&set, &moscow), "100 kg x 5 on 2026-03-02");
        assert_eq!(describe_record(&set, &utc), "100 kg x 5 on 2026-03-01");
    }

    #[test]
    fn test_describe_load_bodyweight() {
        let set = create_set(0.0, 12, Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap());
        assert_eq!(describe_load(&set), "12 reps");
    }
}
