//! solverbench CLI
//!
//! Runs solver benchmark campaigns and aggregates their logs.
//!
//! ## Commands
//!
//! - `plan`: list the invocations a campaign would run
//! - `run`: execute a campaign under deadlines and write its ledger
//! - `extract`: parse one solver log into a result record
//! - `report`: extract every log of a campaign and print comparative counts

mod config;
mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};

use solverbench_core::{aggregate, extract, extract_instance, CoverageMode, Dialect, TieRule};
use solverbench_runner::{LogProgress, RunLedger, WorkerPool};

use crate::config::CampaignConfig;

#[derive(Parser)]
#[command(name = "solverbench")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Benchmark execution and result aggregation for external solvers", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the jobs a campaign expands to without running them
    Plan {
        /// Campaign file (TOML)
        campaign: PathBuf,
    },

    /// Run every instance × configuration pair of a campaign
    Run {
        /// Campaign file (TOML)
        campaign: PathBuf,

        /// Override the campaign's max parallel runs
        #[arg(short, long, env = "SOLVERBENCH_CONCURRENCY")]
        concurrency: Option<usize>,

        /// Ledger output path (default: <output_dir>/ledger-<batch>.json)
        #[arg(long)]
        ledger: Option<PathBuf>,
    },

    /// Parse one solver log and print its record as JSON
    Extract {
        /// Solver stdout log
        log: PathBuf,

        /// Configuration label to attach to the record
        #[arg(short, long, default_value = "default")]
        label: String,

        /// Elapsed-time ceiling in seconds
        #[arg(short, long)]
        max_time: f64,

        /// Output dialect: short | full
        #[arg(short, long, default_value = "full")]
        dialect: String,

        /// Parse the latest of two equal-count solution lines
        #[arg(long)]
        prefer_latest: bool,
    },

    /// Aggregate a campaign's logs into per-configuration counts
    Report {
        /// Campaign file (TOML)
        campaign: PathBuf,

        /// Override the coverage mode: intersection | union
        #[arg(long)]
        coverage: Option<String>,

        /// Also write the full report as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    solverbench_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Plan { campaign } => cmd_plan(&campaign),
        Commands::Run {
            campaign,
            concurrency,
            ledger,
        } => cmd_run(&campaign, concurrency, ledger.as_deref()).await,
        Commands::Extract {
            log,
            label,
            max_time,
            dialect,
            prefer_latest,
        } => cmd_extract(&log, &label, max_time, &dialect, prefer_latest),
        Commands::Report {
            campaign,
            coverage,
            output,
        } => cmd_report(&campaign, coverage.as_deref(), output.as_deref()),
    }
}

fn cmd_plan(campaign_path: &Path) -> Result<()> {
    let config = CampaignConfig::load(campaign_path)?;
    let planned = config.campaign()?.plan_jobs();
    for p in &planned {
        println!("{}", p.job.invocation);
    }
    println!();
    println!(
        "{} jobs ({} instances × {} configurations), deadline {}ms each",
        planned.len(),
        config.instances.len(),
        config.configurations.len(),
        planned.first().map(|p| p.job.deadline_ms()).unwrap_or(0),
    );
    Ok(())
}

async fn cmd_run(campaign_path: &Path, concurrency: Option<usize>, ledger_path: Option<&Path>) -> Result<()> {
    let mut config = CampaignConfig::load(campaign_path)?;
    if let Some(concurrency) = concurrency {
        config.concurrency = concurrency;
        config.validate()?;
    }

    let campaign = config.campaign()?;
    let jobs: Vec<_> = campaign.plan_jobs().into_iter().map(|p| p.job).collect();
    if jobs.is_empty() {
        anyhow::bail!("campaign has no instances to run");
    }

    let pool = WorkerPool::new(config.concurrency)?;
    let mut ledger = RunLedger::new();
    info!(
        batch_id = %ledger.batch_id,
        jobs = jobs.len(),
        concurrency = config.concurrency,
        "starting batch"
    );

    let start = Instant::now();
    pool.run_all(jobs, &mut ledger, &LogProgress::new()).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    let ledger_path = ledger_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.ledger_path(&ledger.batch_id));
    ledger
        .write_json(&ledger_path)
        .with_context(|| format!("write ledger {}", ledger_path.display()))?;

    print!("{}", render::render_batch(&ledger.batch_id, &ledger.summary(), duration_ms));
    println!("Ledger: {}", ledger_path.display());
    Ok(())
}

fn cmd_extract(log: &Path, label: &str, max_time: f64, dialect: &str, prefer_latest: bool) -> Result<()> {
    if !max_time.is_finite() || max_time <= 0.0 {
        anyhow::bail!("--max-time must be positive, got {}", max_time);
    }
    let tie_rule = if prefer_latest {
        TieRule::PreferLatest
    } else {
        TieRule::PreferEarlier
    };
    let dialect = Dialect::new(dialect.parse()?).with_tie_rule(tie_rule);

    let record = extract(log, label, max_time, &dialect);
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn cmd_report(campaign_path: &Path, coverage: Option<&str>, output: Option<&Path>) -> Result<()> {
    let config = CampaignConfig::load(campaign_path)?;
    let coverage: CoverageMode = match coverage {
        Some(mode) => mode.parse()?,
        None => config.coverage,
    };

    let campaign = config.campaign()?;
    let labels = campaign.labels();
    let max_time = campaign.max_time_secs();
    let dialect = config.dialect();
    let best_known = config.best_known_table()?;

    let sets: Vec<_> = campaign
        .instance_names()
        .iter()
        .map(|name| extract_instance(&campaign.output_dir, name, &labels, max_time, &dialect))
        .collect();
    let report = aggregate(labels, max_time, coverage, &sets, best_known.as_ref());

    print!("{}", render::render_report(&report));

    if let Some(path) = output {
        let content = serde_json::to_string_pretty(&report).context("serialize report")?;
        std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
        println!("\n✓ Report written to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_global_flags() {
        let cli = Cli::try_parse_from([
            "solverbench",
            "run",
            "campaign.toml",
            "--concurrency",
            "8",
            "--json",
            "-v",
        ])
        .unwrap();
        assert!(cli.json);
        assert!(cli.verbose);
        match cli.command {
            Commands::Run {
                campaign,
                concurrency,
                ledger,
            } => {
                assert_eq!(campaign, PathBuf::from("campaign.toml"));
                assert_eq!(concurrency, Some(8));
                assert!(ledger.is_none());
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_extract_defaults() {
        let cli =
            Cli::try_parse_from(["solverbench", "extract", "a+b.log", "--max-time", "60"]).unwrap();
        match cli.command {
            Commands::Extract {
                label,
                max_time,
                dialect,
                prefer_latest,
                ..
            } => {
                assert_eq!(label, "default");
                assert_eq!(max_time, 60.0);
                assert_eq!(dialect, "full");
                assert!(!prefer_latest);
            }
            _ => panic!("expected extract"),
        }
    }

    #[test]
    fn test_extract_requires_max_time() {
        assert!(Cli::try_parse_from(["solverbench", "extract", "a.log"]).is_err());
    }

    #[test]
    fn test_cmd_extract_rejects_unknown_dialect() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("x.log");
        std::fs::write(&log, "").unwrap();
        assert!(cmd_extract(&log, "cfg", 10.0, "verbose", false).is_err());
        assert!(cmd_extract(&log, "cfg", 10.0, "short", true).is_ok());
    }
}
