use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use divvy_core::config::DivvyConfig;
use divvy_core::ingestion::{self, FileStatus};
use divvy_core::pipeline::{self, DividendContext};
use divvy_core::roster::{self, ContentRecord};
use divvy_core::upload::{apply_field_map, FormService};
use divvy_core::{daily, leads, outputs, snapshot};
use polars::prelude::DataFrame;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Creator-content dividend pipeline", long_about = None)]
struct Cli {
    /// Run configuration file
    #[arg(long, default_value = "divvy.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute daily metric deltas from today's platform exports
    Daily(DailyArgs),
    /// Run the dividend allocation and write reports
    Dividend(DividendArgs),
    /// Promote today's snapshot to previous-day state
    Rotate,
    /// Push the daily metric table to its form entry
    UploadDaily,
}

#[derive(Args, Debug, Default)]
struct DailyArgs {
    /// Write the daily frame here instead of the reports directory
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
struct DividendArgs {
    /// Push per-person payouts to the form service after the run
    #[arg(long)]
    upload: bool,
    /// Registry JSON export to use instead of fetching entries live
    #[arg(long)]
    roster_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = DivvyConfig::load(&cli.config)
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;

    match cli.command {
        Command::Daily(args) => cmd_daily(&config, args),
        Command::Dividend(args) => cmd_dividend(&config, args).await,
        Command::Rotate => cmd_rotate(&config),
        Command::UploadDaily => cmd_upload_daily(&config).await,
    }
}

/// Runs report on yesterday's activity.
fn report_date() -> NaiveDate {
    Local::now().date_naive() - Duration::days(1)
}

fn cmd_daily(config: &DivvyConfig, args: DailyArgs) -> Result<()> {
    let date = report_date();
    let frame = build_daily_frame(config, date)?;

    let path = args
        .out
        .unwrap_or_else(|| outputs::report_path(&config.paths.reports_dir, "daily_metrics", date));
    outputs::write_csv_report(&frame, &path)?;
    info!(rows = frame.height(), path = %path.display(), "daily metric deltas written");
    Ok(())
}

async fn cmd_dividend(config: &DivvyConfig, args: DividendArgs) -> Result<()> {
    let date = report_date();
    let frame = build_daily_frame(config, date)?;
    let records = load_roster(config, args.roster_file).await?;
    if records.is_empty() {
        return Err(anyhow!("registry came back empty; nothing to allocate"));
    }

    let lead_records = leads::read_leads(&config.paths.leads)
        .with_context(|| format!("failed to read leads file {}", config.paths.leads.display()))?;
    let pool_yuan = leads::pool_from_leads(&lead_records, config.pool.lead_price_yuan);

    let context = DividendContext {
        report_date: date,
        weights: config.weights,
        split_table: config.split,
        unit_yuan: config.pool.unit_yuan,
        pool_yuan,
        records,
    };
    let run = pipeline::run_dividend(&context, &frame)?;

    let item_frame = outputs::item_payout_frame(&run.items, date)?;
    let person_frame = outputs::person_payout_frame(&run.persons, date)?;
    let item_path = outputs::report_path(&config.paths.reports_dir, "item_payouts", date);
    let person_path = outputs::report_path(&config.paths.reports_dir, "person_payouts", date);
    outputs::write_csv_report(&item_frame, &item_path)?;
    outputs::write_csv_report(&person_frame, &person_path)?;

    let summary_path = config
        .paths
        .reports_dir
        .join(format!("run_summary_{}.json", date.format("%Y-%m-%d")));
    outputs::write_summary_json(&run.summary, &summary_path)?;
    info!(
        items = %item_path.display(),
        persons = %person_path.display(),
        summary = %summary_path.display(),
        "dividend reports written"
    );

    if args.upload {
        if run.persons.is_empty() {
            info!("no person payouts to upload");
        } else {
            let service = form_service(config)?;
            let rows = outputs::person_payout_rows(&run.persons, date);
            let mapped = apply_field_map(&rows, &config.form.payout_fields);
            let created = service.batch_create(&config.form.payouts, &mapped).await?;
            info!(created, "person payouts pushed to form service");
        }
    }

    Ok(())
}

fn cmd_rotate(config: &DivvyConfig) -> Result<()> {
    snapshot::rotate(&config.paths.today_snapshot, &config.paths.previous_snapshot)
        .context("snapshot rotation failed")?;
    Ok(())
}

async fn cmd_upload_daily(config: &DivvyConfig) -> Result<()> {
    let date = report_date();
    let frame = build_daily_frame(config, date)?;
    let rows = outputs::daily_metric_rows(&frame)?;
    if rows.is_empty() {
        info!("no daily metric rows to upload");
        return Ok(());
    }

    let service = form_service(config)?;
    let mapped = apply_field_map(&rows, &config.form.daily_fields);
    let created = service.batch_create(&config.form.daily_metrics, &mapped).await?;
    info!(created, "daily metrics pushed to form service");
    Ok(())
}

/// Today's exports → canonical snapshot (persisted for rotation) → deltas
/// against the previous-day snapshot.
fn build_daily_frame(config: &DivvyConfig, date: NaiveDate) -> Result<DataFrame> {
    let today = collect_today_frame(config)?;
    snapshot::write_snapshot(&today, &config.paths.today_snapshot)?;

    let yesterday = if config.paths.previous_snapshot.exists() {
        Some(snapshot::read_snapshot(&config.paths.previous_snapshot)?)
    } else {
        warn!(
            path = %config.paths.previous_snapshot.display(),
            "no previous-day snapshot; treating all counters as fresh"
        );
        None
    };

    let frame = daily::compute_daily(&today, yesterday.as_ref(), &config.filters.cutoffs(), date)?;
    Ok(frame)
}

fn collect_today_frame(config: &DivvyConfig) -> Result<DataFrame> {
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();
    for entry in glob::glob(&config.paths.exports)? {
        match entry {
            Ok(path) => {
                let contents = std::fs::read(&path)
                    .with_context(|| format!("failed to read export {}", path.display()))?;
                files.push((path.display().to_string(), contents));
            }
            Err(err) => warn!(error = %err, "could not read path from export glob"),
        }
    }

    if files.is_empty() {
        return Err(anyhow!(
            "no export files matched '{}'",
            config.paths.exports
        ));
    }

    let inputs: Vec<ingestion::FileInput<'_>> = files
        .iter()
        .map(|(path, contents)| ingestion::FileInput {
            path: path.as_str(),
            contents: contents.as_slice(),
        })
        .collect();

    let batch = ingestion::ingest_files(&inputs, &HashSet::new());
    for report in &batch.reports {
        match report.status {
            FileStatus::Parsed => info!(path = %report.path, hash = %report.hash, "export parsed"),
            FileStatus::Duplicate => info!(path = %report.path, "duplicate export skipped"),
            FileStatus::Failed => {
                for attempt in &report.parser_attempts {
                    warn!(path = %report.path, parser = attempt.parser, message = %attempt.message, "export rejected");
                }
            }
        }
    }

    let exports: Vec<_> = batch
        .parsed
        .into_iter()
        .map(|parsed| parsed.export)
        .collect();
    if exports.is_empty() {
        return Err(anyhow!("none of the export files could be parsed"));
    }

    Ok(snapshot::snapshot_frame(&exports)?)
}

/// The registry either comes from a local JSON export or straight from the
/// form service.
async fn load_roster(
    config: &DivvyConfig,
    roster_file: Option<PathBuf>,
) -> Result<Vec<ContentRecord>> {
    let docs: Vec<serde_json::Value> = match roster_file.or_else(|| config.paths.roster.clone()) {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read roster file {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("roster file {} is not a JSON array", path.display()))?
        }
        None => {
            let service = form_service(config)?;
            service.fetch_entries(&config.form.registry).await?
        }
    };

    Ok(roster::decode_registry(&docs, &config.form.registry_fields))
}

fn form_service(config: &DivvyConfig) -> Result<FormService> {
    let token = std::env::var(&config.form.api_key_env).with_context(|| {
        format!(
            "form service token missing; set {}",
            config.form.api_key_env
        )
    })?;
    Ok(FormService::new(&config.form.base_url, token))
}
