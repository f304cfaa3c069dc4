use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::fs;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voicetally::activity::Activity;
use voicetally::cli::{Cli, Commands, ConfigCommands};
use voicetally::config::Config;
use voicetally::db::Database;
use voicetally::ingest::{event_channel, run_event_worker};
use voicetally::report::{self, FullRoster};
use voicetally::timeutil::{DAY_MS, format_day, format_duration_ms, utc_day_start};
use voicetally::tracker::VoiceEvent;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Stats { guild, user } => handle_stats(guild, user),
        Commands::Rank {
            guild,
            activity,
            limit,
        } => handle_rank(guild, &activity, limit),
        Commands::Heatmap {
            guild,
            user,
            activity,
            days,
        } => handle_heatmap(guild, user, &activity, days),
        Commands::Replay { file } => handle_replay(&file).await,
        Commands::Config { command } => handle_config_command(command),
        Commands::Status => handle_status(),
    }
}

fn handle_stats(guild: u64, user: u64) -> Result<()> {
    let config = load_or_default_config()?;
    let database = Database::open(&config.db_path)?;
    let now = Utc::now().timestamp_millis();

    let stats = report::user_stats(&database, guild, user, now)?;

    println!("Voice stats for user {user} in guild {guild}");
    for entry in &stats.activities {
        let percent = if entry.activity == Activity::Connected {
            String::new()
        } else {
            format!(", {:.0}% of connected", entry.pct_of_connected)
        };
        println!(
            "- {}: {} (max {}, {} session(s){percent})",
            entry.activity,
            format_duration_ms(entry.live_ms),
            format_duration_ms(entry.max_ms),
            entry.count
        );
    }
    println!("- channel switches: {}", stats.count_switch);
    println!(
        "- daily streak: {} (best {})",
        stats.daily_streak, stats.max_daily_streak
    );
    println!(
        "- last activity: {}",
        if stats.last_activity == 0 {
            "none".to_string()
        } else {
            format_day(stats.last_activity)
        }
    );

    Ok(())
}

fn handle_rank(guild: u64, activity: &str, limit: Option<usize>) -> Result<()> {
    let config = load_or_default_config()?;
    let database = Database::open(&config.db_path)?;
    let activity = activity.parse::<Activity>()?;
    let now = Utc::now().timestamp_millis();

    let entries = report::rank(
        &database,
        &FullRoster,
        guild,
        activity,
        now,
        limit.unwrap_or(config.rank_limit),
    )?;

    if entries.is_empty() {
        println!("No {activity} data for guild {guild} yet");
        return Ok(());
    }

    println!("Top {activity} time in guild {guild}");
    for (index, entry) in entries.iter().enumerate() {
        println!(
            "{}. user {} - {}",
            index + 1,
            entry.user_id,
            format_duration_ms(entry.total_ms)
        );
    }

    Ok(())
}

fn handle_heatmap(guild: u64, user: Option<u64>, activity: &str, days: Option<u32>) -> Result<()> {
    let config = load_or_default_config()?;
    let database = Database::open(&config.db_path)?;
    let activity = activity.parse::<Activity>()?;
    let now = Utc::now().timestamp_millis();

    let window_days = days.unwrap_or(config.heatmap_days);
    let cutoff = utc_day_start(now) - i64::from(window_days.saturating_sub(1)) * DAY_MS;

    let series = report::heatmap_series(&database, guild, user, activity, now)?;
    let window = series
        .iter()
        .filter(|point| point.day >= cutoff)
        .collect::<Vec<_>>();

    if window.is_empty() {
        println!("No {activity} data in the last {window_days} day(s)");
        return Ok(());
    }

    let scope = user
        .map(|id| format!("user {id}"))
        .unwrap_or_else(|| "all users".to_string());
    println!("{activity} per day for {scope} in guild {guild}");
    for point in window {
        println!(
            "{}  {}  ({}ms of {}ms connected)",
            format_day(point.day),
            format_duration_ms(point.value_ms),
            point.value_ms,
            point.connected_ms
        );
    }

    Ok(())
}

async fn handle_replay(file: &Path) -> Result<()> {
    let config = load_or_default_config()?;
    let database = Database::open(&config.db_path)?;

    if config.environment.clears_markers_on_startup() {
        let cleared = database.clear_session_markers()?;
        if cleared > 0 {
            info!(cleared, "forgot open sessions from a previous run");
        }
    }

    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read event file: {}", file.display()))?;

    let (ingestor, receiver) = event_channel();
    let worker = tokio::spawn(run_event_worker(database, receiver));

    let mut submitted = 0usize;
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event: VoiceEvent = serde_json::from_str(line)
            .with_context(|| format!("Invalid voice event on line {}", number + 1))?;
        ingestor.submit(event).await?;
        submitted += 1;
    }

    drop(ingestor);
    worker.await.context("event worker panicked")??;

    println!("Replayed {submitted} event(s) from {}", file.display());
    Ok(())
}

fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Set { key, value } => {
            let mut config = load_or_default_config()?;
            config.set_value(&key, &value)?;
            config.ensure_bootstrap_files()?;
            config.save()?;

            println!("Config saved: {key} = {value}");
            Ok(())
        }
        ConfigCommands::Get { key } => {
            let config = load_or_default_config()?;
            let value = config
                .get_value(&key)
                .with_context(|| format!("Unsupported config key: {key}"))?;

            println!("{value}");
            Ok(())
        }
    }
}

fn handle_status() -> Result<()> {
    let config = load_or_default_config()?;
    let database = Database::open(&config.db_path)?;
    let summary = database.summary()?;

    println!("VoiceTally status");
    println!("- db_path: {}", config.db_path.display());
    println!("- environment: {}", config.environment);
    println!("- tracked_users: {}", summary.tracked_users);
    println!("- open_sessions: {}", summary.open_markers);
    println!("- daily_rows: {}", summary.daily_rows);

    Ok(())
}

fn load_or_default_config() -> Result<Config> {
    Config::load().or_else(|_| {
        let config = Config::default();
        config.ensure_bootstrap_files()?;
        config.save()?;
        Ok(config)
    })
}
