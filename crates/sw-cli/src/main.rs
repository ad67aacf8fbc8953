use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sw_config::{load_layered_yaml, report_unused_keys, LoadedConfig, UnusedKeyPolicy};
use sw_report::{OrchestratorSettings, ReportService};
use sw_source::{RetryPolicy, SourceSpec, StoreDataSource};
use tracing::warn;

#[derive(Parser)]
#[command(name = "sw")]
#[command(about = "storewatch uptime/downtime reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> overrides)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Report commands
    Report {
        #[command(subcommand)]
        cmd: ReportCmd,
    },
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Directory with store_status.csv, menu_hours.csv, timezones.csv
    #[arg(long, conflicts_with = "das_url")]
    data_dir: Option<PathBuf>,

    /// Data-access service base URL (overrides source.das_url)
    #[arg(long)]
    das_url: Option<String>,

    /// Layered config paths in merge order
    #[arg(long = "config")]
    config_paths: Vec<String>,

    /// Fail on unknown config keys instead of warning
    #[arg(long, default_value_t = false)]
    strict_config: bool,
}

#[derive(Subcommand)]
enum ReportCmd {
    /// Run a full report synchronously and write the CSV artifact
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// Output directory (overrides output.dir)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print per-day extrapolation and the report row for one store
    Store {
        /// Store id
        store_id: String,

        #[command(flatten)]
        source: SourceArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env.local if present (dev convenience). Silent if missing.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Report { cmd } => match cmd {
            ReportCmd::Run { source, out } => {
                let loaded = load_config(&source)?;
                let mut cfg = loaded.pipeline()?;
                if let Some(dir) = out {
                    cfg.output_dir = dir;
                }
                let spec = source_spec(&source, cfg.das_url.as_deref(), &cfg.order_by)?;
                let src = spec
                    .open(RetryPolicy::from(&cfg.retry))
                    .with_context(|| format!("open source {}", spec.describe()))?;
                let settings = OrchestratorSettings::from_config(&cfg, loaded.config_hash.clone())?;

                let outcome = ReportService::new(src, settings).run_report().await?;
                println!("job_id={}", outcome.job_id);
                println!("report_path={}", outcome.report_path.display());
                println!("stores={}", outcome.stores_seen);
                println!("rows={}", outcome.rows_written);
                println!("elapsed_ms={}", outcome.elapsed_ms);
            }

            ReportCmd::Store { store_id, source } => {
                let loaded = load_config(&source)?;
                let cfg = loaded.pipeline()?;
                let spec = source_spec(&source, cfg.das_url.as_deref(), &cfg.order_by)?;
                let src = spec
                    .open(RetryPolicy::from(&cfg.retry))
                    .with_context(|| format!("open source {}", spec.describe()))?;
                let resolver = cfg.timezone_resolver()?;

                let tz_name = src.get_timezone(&store_id).await?;
                let tz = resolver.resolve(&store_id, tz_name.as_deref());
                let hours = src.get_business_hours(&store_id).await?;
                let observations = src.get_observations(&store_id).await?;

                println!("store_id={store_id}");
                println!("timezone={}", tz.name());
                println!("rules={}", hours.len());
                println!("polls={}", observations.len());
                for day in sw_uptime::extrapolate_store(&store_id, tz, &hours, &observations) {
                    println!("{}", serde_json::to_string(&day)?);
                }
                match sw_uptime::compute_store_row(&store_id, tz, &hours, &observations) {
                    Some(row) => println!("{}", serde_json::to_string(&row)?),
                    None => println!("row=none"),
                }
            }
        },
    }

    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();
}

fn load_config(args: &SourceArgs) -> Result<LoadedConfig> {
    let path_refs: Vec<&str> = args.config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = load_layered_yaml(&path_refs)?;

    let policy = if args.strict_config {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = report_unused_keys(&loaded.config_json, policy)?;
    if !report.is_clean() {
        warn!(unused = ?report.unused_leaf_pointers, "config has unused keys");
    }
    Ok(loaded)
}

fn source_spec(args: &SourceArgs, cfg_url: Option<&str>, order_by: &str) -> Result<SourceSpec> {
    if let Some(dir) = &args.data_dir {
        return Ok(SourceSpec::CsvDir(dir.clone()));
    }
    match args.das_url.as_deref().or(cfg_url) {
        Some(url) => Ok(SourceSpec::Http {
            base_url: url.to_string(),
            order_by: order_by.to_string(),
        }),
        None => bail!("no data source: pass --data-dir or --das-url (or set source.das_url)"),
    }
}
