use std::fmt;

use quest_core::model::{
    AppSettings, LessonMode, MemorizationProgress, REQUIRED_REPETITIONS, UserId,
};
use quest_services::{AppServices, Clock, StreakNotice};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUser { raw: String },
    InvalidMode { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNumber { flag: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUser { raw } => write!(f, "invalid --user value: {raw}"),
            ArgsError::InvalidMode { raw } => write!(f, "invalid --mode value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNumber { flag, raw } => {
                write!(f, "invalid {flag} value: {raw}")
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- lesson      [--db <sqlite_url>] [--user <id>] [--mode read|memorize]");
    eprintln!("  cargo run -p app -- complete    [--db <sqlite_url>] [--user <id>]");
    eprintln!("  cargo run -p app -- memorize    [--db <sqlite_url>] [--user <id>]");
    eprintln!("  cargo run -p app -- profile     [--db <sqlite_url>] [--user <id>]");
    eprintln!("  cargo run -p app -- set-goal    --ayats <n> [--db <sqlite_url>] [--user <id>]");
    eprintln!("  cargo run -p app -- reset       [--db <sqlite_url>] [--user <id>]");
    eprintln!("  cargo run -p app -- leaderboard [--db <sqlite_url>] [--limit <n>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:quest.sqlite3");
    eprintln!("  --user local");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUEST_DB_URL, QUEST_USER, QUEST_QURAN_API_URL");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Lesson,
    Complete,
    Memorize,
    Profile,
    SetGoal,
    Reset,
    Leaderboard,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "lesson" => Some(Self::Lesson),
            "complete" => Some(Self::Complete),
            "memorize" => Some(Self::Memorize),
            "profile" => Some(Self::Profile),
            "set-goal" => Some(Self::SetGoal),
            "reset" => Some(Self::Reset),
            "leaderboard" => Some(Self::Leaderboard),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    user: UserId,
    mode: LessonMode,
    ayats: Option<u16>,
    limit: u32,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUEST_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://quest.sqlite3".into(), normalize_sqlite_url);
        let mut user = std::env::var("QUEST_USER")
            .ok()
            .and_then(|value| UserId::new(value).ok())
            .map_or_else(|| UserId::new("local").expect("default user id"), |id| id);
        let mut mode = LessonMode::Read;
        let mut ayats = None;
        let mut limit = 10;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--user" => {
                    let value = require_value(args, "--user")?;
                    user = UserId::new(value.clone())
                        .map_err(|_| ArgsError::InvalidUser { raw: value })?;
                }
                "--mode" => {
                    let value = require_value(args, "--mode")?;
                    mode = LessonMode::parse(&value)
                        .map_err(|_| ArgsError::InvalidMode { raw: value })?;
                }
                "--ayats" => {
                    let value = require_value(args, "--ayats")?;
                    let parsed: u16 = value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--ayats",
                        raw: value.clone(),
                    })?;
                    ayats = Some(parsed);
                }
                "--limit" => {
                    let value = require_value(args, "--limit")?;
                    limit = value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--limit",
                        raw: value.clone(),
                    })?;
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
            user,
            mode,
            ayats,
            limit,
        })
    }
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
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn print_verse(index: usize, total: usize, verse: &quest_core::model::Verse) {
    println!("  [{}/{}] {}", index + 1, total, verse.key);
    println!("        {}", verse.arabic);
    println!("        {}", verse.translation);
}

fn print_notice(notice: Option<StreakNotice>) {
    if let Some(StreakNotice::Lost { previous }) = notice {
        println!("Your {previous}-day streak has ended. Today is a fresh start.");
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    argv.remove(0);

    let mut iter = argv.into_iter();
    let args = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so
    // core/services stay pure.
    prepare_sqlite_file(&args.db_url)?;
    let services =
        AppServices::new_sqlite(&args.db_url, Clock::default_clock(), &AppSettings::default())
            .await?;

    match cmd {
        Command::Lesson => {
            let snapshot = services.progress().load(&args.user).await?;
            print_notice(snapshot.streak_notice);

            let cursor = snapshot.progress.cursor(args.mode);
            let window = services
                .lessons()
                .resolve_window(cursor, snapshot.progress.daily_ayats())
                .await?;

            println!(
                "Today's {} lesson for {} ({} ayats):",
                args.mode.as_str(),
                args.user,
                window.len()
            );
            for (index, verse) in window.verses().iter().enumerate() {
                print_verse(index, window.len(), verse);
            }
        }
        Command::Complete => {
            let snapshot = services.progress().load(&args.user).await?;
            print_notice(snapshot.streak_notice);

            let cursor = snapshot.progress.cursor(LessonMode::Read);
            let window = services
                .lessons()
                .resolve_window(cursor, snapshot.progress.daily_ayats())
                .await?;

            let report = services
                .progress()
                .complete_lesson(
                    &args.user,
                    LessonMode::Read,
                    &window,
                    &MemorizationProgress::new(),
                )
                .await?;

            println!("Completed {} verses. Streak: {}", report.verses_completed, report.streak);
            println!("{}", report.message);
            if let Some(badge) = report.badge {
                println!("Badge unlocked: {}", badge.name());
            }
        }
        Command::Memorize => {
            let snapshot = services.progress().load(&args.user).await?;
            print_notice(snapshot.streak_notice);

            let cursor = snapshot.progress.cursor(LessonMode::Memorize);
            let window = services
                .lessons()
                .resolve_window(cursor, snapshot.progress.daily_ayats())
                .await?;

            // Walk each verse through its repetitions, then complete.
            let mut repetitions = MemorizationProgress::new();
            for (index, verse) in window.verses().iter().enumerate() {
                print_verse(index, window.len(), verse);
                for round in 1..=REQUIRED_REPETITIONS {
                    println!("        recitation {round}/{REQUIRED_REPETITIONS}");
                    repetitions.record_repetition(verse.key);
                }
            }

            let report = services
                .progress()
                .complete_lesson(&args.user, LessonMode::Memorize, &window, &repetitions)
                .await?;

            println!(
                "Memorized {} verses. Streak: {}",
                report.verses_completed, report.streak
            );
            println!("{}", report.message);
            if let Some(badge) = report.badge {
                println!("Badge unlocked: {}", badge.name());
            }
        }
        Command::Profile => {
            let snapshot = services.progress().load(&args.user).await?;
            print_notice(snapshot.streak_notice);
            let progress = snapshot.progress;

            println!("Profile for {}", args.user);
            println!("  daily goal:        {} ayats", progress.daily_ayats());
            println!("  reading cursor:    {}", progress.cursor(LessonMode::Read));
            println!("  memorize cursor:   {}", progress.cursor(LessonMode::Memorize));
            println!("  current streak:    {}", progress.current_streak());
            println!("  longest streak:    {}", progress.longest_streak());
            println!("  verses read:       {}", progress.total_verses_completed());
            println!("  verses memorized:  {}", progress.total_verses_memorized());
        }
        Command::SetGoal => {
            let Some(ayats) = args.ayats else {
                eprintln!("set-goal requires --ayats <n>");
                print_usage();
                return Ok(());
            };
            services.progress().load(&args.user).await?;
            services.progress().update_daily_ayats(&args.user, ayats).await?;
            println!("Daily goal for {} set to {} ayats.", args.user, ayats);
        }
        Command::Reset => {
            services.progress().load(&args.user).await?;
            services.progress().reset(&args.user).await?;
            println!("Progress for {} reset to the beginning.", args.user);
        }
        Command::Leaderboard => {
            let board = services.social().leaderboard(args.limit).await?;
            if board.is_empty() {
                println!("No readers on the leaderboard yet.");
            }
            for entry in board {
                println!(
                    "{:>3}. {:<20} streak {:>4} (best {:>4}), {} verses",
                    entry.rank,
                    entry.user.as_str(),
                    entry.current_streak,
                    entry.longest_streak,
                    entry.total_verses_completed
                );
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
