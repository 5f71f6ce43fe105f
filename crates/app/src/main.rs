use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use learn_core::model::{LessonId, ModuleId, QuizId, QuizScore};
use learn_core::rewards::RewardKind;
use services::{AppServices, Clock, ProgressTracker, RewardReceipt};

mod toast;

#[derive(Debug, Parser)]
#[command(
    name = "lingo",
    version,
    about = "Track language-learning progress: XP, levels, streaks and badges"
)]
struct Cli {
    /// SQLite database URL or path
    #[arg(long, env = "LINGO_DB_URL", default_value = "sqlite://lingo.sqlite3")]
    db: String,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show level, XP, streak and badge summary (default)
    Status {
        /// Print the overview as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record today's login and update the streak
    Login,
    /// Mark a lesson complete
    Lesson { id: LessonId },
    /// Record a quiz score (0-100)
    Quiz { id: QuizId, score: u32 },
    /// Record a speaking exercise
    Speak,
    /// Record a completed workbook exercise
    Workbook,
    /// Mark a module complete
    Module { id: ModuleId },
    /// List the badge catalog with unlock state
    Badges,
    /// Credit a reward directly by name (e.g. `perfect_quiz`)
    Award { kind: RewardKind },
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<()> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid --db value: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid --db value: {db_url}");
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("failed to create database file {}", path.display()))?;
    }

    Ok(())
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

fn print_receipt(receipt: &RewardReceipt) {
    print_lines(&toast::reward_lines(receipt));
}

async fn run(cli: Cli) -> Result<()> {
    let db_url = normalize_sqlite_url(cli.db);
    prepare_sqlite_file(&db_url)?;
    tracing::debug!(db = %db_url, "opening progress database");
    let mut services = AppServices::new_sqlite(&db_url, Clock::default_clock())
        .await
        .with_context(|| format!("failed to open progress database {db_url}"))?;

    match cli.command.unwrap_or(Command::Status { json: false }) {
        Command::Status { json } => {
            let overview = services.overview();
            if json {
                println!("{}", overview.to_json()?);
            } else {
                print_lines(&toast::overview_lines(&overview));
            }
        }
        Command::Badges => {
            for badge in services.overview().badges {
                let mark = if badge.unlocked { "x" } else { " " };
                println!("[{mark}] {:<20} {}", badge.name, badge.requirement);
            }
        }
        command => {
            let tracker = services.tracker_mut();
            record(tracker, command).await?;
            let unlocked = tracker.check_and_award_badges().await?;
            print_lines(&toast::badge_lines(&unlocked));
        }
    }
    Ok(())
}

async fn record(tracker: &mut ProgressTracker, command: Command) -> Result<()> {
    match command {
        Command::Login => match tracker.record_daily_login().await? {
            Some(receipt) => print_receipt(&receipt),
            None => println!("Already logged in today."),
        },
        Command::Lesson { id } => {
            let receipt = tracker.complete_lesson(id).await?;
            if receipt.is_empty() {
                println!("Lesson already completed.");
            }
            print_receipt(&receipt);
        }
        Command::Quiz { id, score } => {
            let score = QuizScore::new(score)?;
            print_receipt(&tracker.record_quiz_score(id, score).await?);
            println!("Score recorded: {}%", score.value());
        }
        Command::Speak => print_receipt(&tracker.record_speaking_exercise().await?),
        Command::Workbook => print_receipt(&tracker.complete_workbook_exercise().await?),
        Command::Module { id } => {
            let receipt = tracker.complete_module(id).await?;
            if receipt.is_empty() {
                println!("Module already completed.");
            }
            print_receipt(&receipt);
        }
        Command::Award { kind } => {
            let amount = tracker.award_xp(kind).await?;
            println!("+{amount} XP  {kind}");
        }
        Command::Status { .. } | Command::Badges => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    run(cli).await
}
