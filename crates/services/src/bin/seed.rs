use std::fmt;

use chrono::{DateTime, Utc};
use quiz_core::model::{QuizResult, accuracy_percent};
use services::{Clock, GameServices};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    entries: u32,
    topic: String,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidEntries { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidEntries { raw } => write!(f, "invalid --entries value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("FOCUS_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut entries = std::env::var("FOCUS_ENTRIES")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(5);
        let mut topic = std::env::var("FOCUS_TOPIC").unwrap_or_else(|_| "python".into());
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--entries" => {
                    let value = require_value(&mut args, "--entries")?;
                    entries = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidEntries { raw: value.clone() })?;
                }
                "--topic" => {
                    let value = require_value(&mut args, "--topic")?;
                    topic = value;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            entries,
            topic,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p services --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>   SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --entries <n>       Number of leaderboard entries to record (default: 5)");
    eprintln!("  --topic <name>      Quiz topic for the seeded sessions (default: python)");
    eprintln!("  --now <rfc3339>     Fixed current time for deterministic seeding");
    eprintln!("  -h, --help          Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  FOCUS_DB_URL, FOCUS_ENTRIES, FOCUS_TOPIC");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let clock = args.now.map_or_else(Clock::default_clock, Clock::fixed);
    let services = GameServices::new_sqlite(&args.db_url, clock).await?;
    let leaderboard = services.leaderboard();

    let names = ["ace", "nova", "turbo", "comet", "zippy"];
    let total_rounds = 5;

    for i in 0..args.entries {
        let correct = total_rounds - (i % 3);
        let wrong = total_rounds - correct;
        let score = correct * 10 - (wrong * 5).min(correct * 10);

        let result = QuizResult {
            user_name: Some(names[(i as usize) % names.len()].to_string()),
            score,
            best_reaction_time_ms: Some(900 + i * 250),
            accuracy: accuracy_percent(correct, total_rounds),
            topic: args.topic.clone(),
            completed_rounds: total_rounds,
            total_rounds,
        };
        leaderboard.record_result(&result).await;
    }

    println!(
        "Seeded {} leaderboard entries for topic {} into {}",
        args.entries, args.topic, args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
