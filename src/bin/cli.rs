// src/bin/cli.rs
//
//! CLI supporting `ladder`, `user`, and `replay`.
//!
//! Examples:
//! ```bash
//! replaydl ladder                        # every replay of every gen8ou ladder user
//! replaydl ladder gen3ou -u 4 -r 16      # 4 users at a time, 16 replay fetches in flight
//! replaydl user  someuser                # one user's replays
//! replaydl replay gen8doublesubers-1097585496
//! replaydl replay https://replay.pokemonshowdown.com/gen8doublesubers-1097585496.json
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use replaydl::constants::DEFAULT_FORMAT;
use replaydl::progress::{ProgressBarObserver, ProgressObserver, TracingObserver};
use replaydl::{DownloaderConfig, DownloaderConfigBuilder, LadderOrchestrator};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(
        short = 'v',
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase log verbosity: -v = Info, -vv = Debug",
    )]
    verbose: u8,

    #[command(flatten)]
    opts: RunOpts,

    #[command(subcommand)]
    cmd: Command,
}

/// Options shared by every command. Unset values fall back to REPLAYDL_* env vars, then defaults.
#[derive(Args)]
struct RunOpts {
    /// Root of the output tree (replays go to <DIR>/all/)
    #[arg(short = 'o', long, value_name = "DIR", global = true)]
    output_dir: Option<PathBuf>,

    /// Users enumerated concurrently
    #[arg(short = 'u', long, global = true)]
    user_workers: Option<usize>,

    /// Replay fetches in flight across all users
    #[arg(short = 'r', long, global = true)]
    replay_workers: Option<usize>,

    /// Ladder host base URL
    #[arg(long, global = true)]
    ladder_url: Option<String>,

    /// Replay host base URL
    #[arg(long, global = true)]
    replay_url: Option<String>,

    /// Also copy each replay into <DIR>/<userid>/
    #[arg(long, global = true)]
    by_user: bool,

    /// Do not save the raw ladder JSON
    #[arg(long, global = true)]
    no_ladder_snapshot: bool,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Download replays for every ranked user of a format's ladder.
    Ladder {
        /// Ladder format id, e.g. gen8ou
        #[arg(default_value = DEFAULT_FORMAT)]
        format: String,

        /// Disable the progress bar (log lines only)
        #[arg(long)]
        no_progress: bool,
    },

    /// Download every replay listed for one user.
    User {
        /// User id as it appears on the ladder
        user: String,
    },

    /// Download and parse a single replay.
    Replay {
        /// Replay id (gen8ou-123, gen8ou-123.json) or full replay URL
        replay: String,
    },
}

fn build_config(opts: &RunOpts) -> Result<DownloaderConfig> {
    let mut builder = DownloaderConfigBuilder::from_env();
    if let Some(dir) = &opts.output_dir {
        builder = builder.output_dir(dir);
    }
    if let Some(n) = opts.user_workers {
        builder = builder.user_workers(n);
    }
    if let Some(n) = opts.replay_workers {
        builder = builder.replay_workers(n);
    }
    if let Some(url) = &opts.ladder_url {
        builder = builder.ladder_base_url(url);
    }
    if let Some(url) = &opts.replay_url {
        builder = builder.replay_base_url(url);
    }
    if let Some(secs) = opts.timeout {
        let mut http = replaydl::HttpClientConfig::default();
        http.request_timeout = Duration::from_secs(secs);
        builder = builder.http(http);
    }
    builder
        .mirror_by_user(opts.by_user)
        .save_ladder(!opts.no_ladder_snapshot)
        .build()
        .context("invalid configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Loads any variables from .env file that are not already set
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    // Capture `log` records from dependencies
    tracing_log::LogTracer::init().ok();

    let config = build_config(&cli.opts)?;
    info!(
        "Output {} | {} user workers | {} replay workers",
        config.output_dir.display(),
        config.user_workers,
        config.replay_workers
    );

    match cli.cmd {
        Command::Ladder { format, no_progress } => {
            let observer: Arc<dyn ProgressObserver> = if no_progress {
                Arc::new(TracingObserver::new())
            } else {
                Arc::new(ProgressBarObserver::new(&format))
            };
            let orchestrator = LadderOrchestrator::new(config, observer)?;
            let summary = orchestrator
                .run(&format)
                .await
                .with_context(|| format!("ladder download for {format} aborted"))?;
            println!("{summary}");
        }

        Command::User { user } => {
            let orchestrator = LadderOrchestrator::new(config, Arc::new(TracingObserver::new()))?;
            orchestrator.sink().prepare().await?;
            let report = orchestrator.enumerator().enumerate_report(&user).await;
            match report.listed {
                Some(listed) => println!(
                    "Downloaded {} of {} replays for user {} ({} failed)",
                    report.replays.len(),
                    listed,
                    user,
                    report.failed
                ),
                None => println!("Could not list replays for user {user}"),
            }
        }

        Command::Replay { replay } => {
            let orchestrator = LadderOrchestrator::new(config, Arc::new(TracingObserver::new()))?;
            let parsed = orchestrator
                .fetcher()
                .fetch(&replay)
                .await
                .with_context(|| format!("failed to download replay {replay}"))?;
            println!(
                "{} -> {}",
                parsed.id,
                orchestrator.sink().path_for(&parsed.id).display()
            );
            println!(
                "  gen: {}  tier: {}  winner: {}",
                parsed.generation.map(|g| g.to_string()).unwrap_or_else(|| "-".into()),
                parsed.tier.as_deref().unwrap_or("-"),
                parsed.winner.as_deref().unwrap_or("-")
            );
            println!(
                "  p1: {}\n  p2: {}",
                parsed.pokemon_by_player.p1.join(", "),
                parsed.pokemon_by_player.p2.join(", ")
            );
        }
    }

    Ok(())
}
