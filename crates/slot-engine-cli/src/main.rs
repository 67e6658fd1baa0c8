use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use slot_engine::{
    group_by_local_day, resolve_timezone, AvailabilityEngine, EngineConfig, InMemoryStore,
    RawSlotRequest, SlotRequest, StoreSnapshot,
};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "slots")]
#[command(about = "Compute bookable appointment slots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute availability for one request against a store snapshot
    Compute {
        /// JSON snapshot of businesses, policies, schedules, blocks and appointments
        #[arg(long)]
        snapshot: PathBuf,

        /// JSON availability request
        #[arg(long)]
        request: PathBuf,

        /// Reference instant (RFC 3339); defaults to the system clock
        #[arg(long)]
        now: Option<String>,

        /// JSON engine configuration
        #[arg(long)]
        config: Option<PathBuf>,

        /// Group slots by local calendar day
        #[arg(long)]
        by_day: bool,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Compute {
            snapshot,
            request,
            now,
            config,
            by_day,
            pretty,
        } => {
            let output = compute(&snapshot, &request, now.as_deref(), config.as_deref(), by_day)
                .await?;
            let rendered = if pretty {
                serde_json::to_string_pretty(&output)
            } else {
                serde_json::to_string(&output)
            }
            .context("Failed to serialize output")?;
            println!("{rendered}");
        }
    }

    Ok(())
}

async fn compute(
    snapshot_path: &Path,
    request_path: &Path,
    now: Option<&str>,
    config_path: Option<&Path>,
    by_day: bool,
) -> Result<serde_json::Value> {
    let snapshot = StoreSnapshot::from_json_str(&read(snapshot_path)?)
        .with_context(|| format!("Failed to load snapshot {}", snapshot_path.display()))?;
    let raw: RawSlotRequest = serde_json::from_str(&read(request_path)?)
        .with_context(|| format!("Failed to parse request {}", request_path.display()))?;
    let request = raw.validate().context("Invalid request")?;

    let config = match config_path {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let now = match now {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("Invalid --now '{raw}'"))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    debug!(%now, "reference instant");

    let engine = AvailabilityEngine::new(InMemoryStore::new(snapshot), config)
        .context("Invalid engine configuration")?;
    let slots = engine
        .compute_availability(&request, now)
        .await
        .context("Failed to compute availability")?;

    if by_day {
        let tz = resolve_timezone(&display_zone(&request, engine.store().snapshot()));
        let buckets = group_by_local_day(&slots, &tz);
        serde_json::to_value(buckets).context("Failed to serialize day buckets")
    } else {
        serde_json::to_value(slots).context("Failed to serialize slots")
    }
}

/// The zone the engine computed in: request override, then the business row.
fn display_zone(request: &SlotRequest, snapshot: &StoreSnapshot) -> String {
    request
        .time_zone
        .clone()
        .or_else(|| {
            snapshot
                .businesses
                .iter()
                .find(|b| b.id == request.business_id)
                .and_then(|b| b.timezone.clone())
        })
        .unwrap_or_else(|| "UTC".to_string())
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
