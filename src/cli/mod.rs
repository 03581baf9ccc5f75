//! Command-line interface for livesync.
//!
//! Provides commands for running a sync once, repeating it on an interval,
//! inspecting the resolved configuration and previewing slugs.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Duration;
use clap::{Parser, Subcommand};
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::adapters::{BunnyMirror, Traced, WebflowStore, YouTubeSource};
use crate::config::{load_config, ResolvedConfig};
use crate::core::{slugify, Reconciler};
use crate::domain::{MirrorAction, RecordAction, SyncReport};

/// livesync - Mirror recent livestreams to a CDN and sync them into a CMS
#[derive(Parser, Debug)]
#[command(name = "livesync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (discovered from the working directory if not provided)
    #[arg(short, long, global = true, env = "LIVESYNC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one sync pass and exit
    Run {
        /// Override the lookback window in days
        #[arg(short, long)]
        window_days: Option<i64>,

        /// Write the run report as JSON to this file
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Run a sync pass on a fixed interval until interrupted
    Watch {
        /// Minutes between runs
        #[arg(short, long, default_value = "60")]
        interval_minutes: u64,
    },

    /// Show resolved configuration (secrets redacted)
    Config,

    /// Print the slug a title would get
    Slug {
        /// Video title
        title: String,
    },
}

impl Cli {
    /// Whether the command needs the config file
    pub fn needs_config(&self) -> bool {
        !matches!(self.command, Commands::Slug { .. })
    }

    /// Load configuration for commands that need it
    pub fn load_config(&self) -> Result<Option<ResolvedConfig>> {
        if !self.needs_config() {
            return Ok(None);
        }
        load_config(self.config.as_deref()).map(Some)
    }

    /// Execute the CLI command
    pub async fn execute(self, config: Option<ResolvedConfig>) -> Result<()> {
        match self.command {
            Commands::Run {
                window_days,
                report: report_path,
            } => {
                // The reconciler, and with it any temporary scratch dir, is
                // gone by the time the report comes back
                let report = run_once(&require(config)?, window_days, report_path.as_deref()).await?;
                if report.failures() > 0 {
                    eprintln!(
                        "\n[Run {} finished with {} failed video(s)]",
                        report.run_id,
                        report.failures()
                    );
                    std::process::exit(1);
                }
                eprintln!("\n[Run {} completed successfully]", report.run_id);
                Ok(())
            }
            Commands::Watch { interval_minutes } => {
                watch(&require(config)?, interval_minutes).await
            }
            Commands::Config => show_config(&require(config)?),
            Commands::Slug { title } => {
                println!("{}", slugify(&title));
                Ok(())
            }
        }
    }
}

fn require(config: Option<ResolvedConfig>) -> Result<ResolvedConfig> {
    config.context("Configuration not loaded")
}

/// Wire up the vendor collaborators behind tracing decorators
pub fn build_reconciler(config: &ResolvedConfig) -> Result<Reconciler> {
    let source = YouTubeSource::from_config(config.youtube.clone());
    let mirror = BunnyMirror::new(config.bunnycdn.clone(), config.dl_path.clone())
        .context("Failed to set up BunnyCDN mirror")?;
    let records = WebflowStore::from_config(config.webflow.clone());

    Ok(Reconciler::new(
        Arc::new(Traced::new(source)),
        Arc::new(Traced::new(mirror)),
        Arc::new(Traced::new(records)),
    )
    .with_window(config.window()))
}

/// Run one sync pass
async fn run_once(
    config: &ResolvedConfig,
    window_days: Option<i64>,
    report_path: Option<&Path>,
) -> Result<SyncReport> {
    let mut reconciler = build_reconciler(config)?;
    if let Some(days) = window_days {
        if days <= 0 {
            anyhow::bail!("--window-days must be positive, got {}", days);
        }
        reconciler = reconciler.with_window(Duration::days(days));
    }

    let report = reconciler.run().await.context("Sync run aborted")?;
    print_report(&report);

    if let Some(path) = report_path {
        write_report(&report, path)?;
        eprintln!("Report written to {}", path.display());
    }
    Ok(report)
}

/// Repeat sync passes until Ctrl-C
async fn watch(config: &ResolvedConfig, interval_minutes: u64) -> Result<()> {
    if interval_minutes == 0 {
        anyhow::bail!("--interval-minutes must be at least 1");
    }

    let reconciler = build_reconciler(config)?;
    info!(interval_minutes, "Watching for new videos");

    // Set up Ctrl+C handler
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        let _ = stop_tx.send(());
    });

    let period = std::time::Duration::from_secs(interval_minutes * 60);
    let runs = watch_until(&reconciler, period, async {
        stop_rx.await.ok();
    })
    .await;
    info!(runs, "Stopped watching");
    Ok(())
}

/// Run the reconciler every `period` until `stop` resolves, including while
/// a run is in flight. Returns the number of runs that finished.
pub async fn watch_until<F>(
    reconciler: &Reconciler,
    period: std::time::Duration,
    stop: F,
) -> usize
where
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(period);
    // A run longer than the period must not trigger a burst of catch-up runs
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(stop);

    let mut runs = 0;
    loop {
        tokio::select! {
            biased;
            _ = &mut stop => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            biased;
            _ = &mut stop => {
                info!("Interrupted during a run, stopping");
                break;
            }
            result = reconciler.run() => {
                runs += 1;
                match result {
                    Ok(report) => print_report(&report),
                    Err(e) => error!(error = %e, "Sync run aborted, will retry next interval"),
                }
            }
        }
    }
    runs
}

fn write_report(report: &SyncReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report: {}", path.display()))
}

fn print_report(report: &SyncReport) {
    println!("Run ID: {}", report.run_id);
    println!("Videos: {}", report.outcomes.len());
    println!(
        "Mirrored: {}  Record writes: {}  Failures: {}",
        report.mirrors_performed(),
        report.record_writes(),
        report.failures()
    );

    for outcome in &report.outcomes {
        let mirror = match &outcome.mirror {
            MirrorAction::AlreadyPresent => "present".to_string(),
            MirrorAction::Mirrored => "mirrored".to_string(),
            MirrorAction::Failed { error } => format!("FAILED ({})", error),
        };
        let record = match &outcome.record {
            RecordAction::Created { record_id } => format!("created {}", record_id),
            RecordAction::Duplicate => "duplicate".to_string(),
            RecordAction::Updated { record_id } => format!("updated {}", record_id),
            RecordAction::Unchanged { record_id } => format!("unchanged {}", record_id),
            RecordAction::NoChange => "no change".to_string(),
            RecordAction::Skipped => "skipped".to_string(),
            RecordAction::Failed { error } => format!("FAILED ({})", error),
        };
        println!("  {}: mirror {}, record {}", outcome.video_id, mirror, record);
    }
}

/// Show resolved configuration
fn show_config(config: &ResolvedConfig) -> Result<()> {
    println!("Config file: {}", config.config_file.display());
    println!("YouTube channel: {}", config.youtube.channel_id);
    println!(
        "BunnyCDN zone: {} (region {})",
        config.bunnycdn.storage_zone, config.bunnycdn.storage_region
    );
    match &config.bunnycdn.public_host {
        Some(host) => println!("Public host: {}", host),
        None => println!("Public host: {}.b-cdn.net (default)", config.bunnycdn.storage_zone),
    }
    println!("Webflow collection: {}", config.webflow.collection_id);
    println!("Window: {} days", config.window_days);
    match &config.dl_path {
        Some(path) => println!("Scratch dir: {}", path.display()),
        None => println!("Scratch dir: (temporary)"),
    }
    match &config.log_file {
        Some(path) => println!("Log file: {}", path.display()),
        None => println!("Log file: (none)"),
    }
    println!("API keys: <redacted>");
    Ok(())
}
