//! Process command implementation
//!
//! Loads records from a CSV file, resolves the worker configuration, runs
//! the fan-out/fan-in pipeline and reports the aggregated outcome. Pressing
//! ctrl-c cancels the batch cooperatively: in-flight analyses finish,
//! everything else is reported as cancelled.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Args;

use crate::cli::output;
use crate::config::{EffectiveConfig, WordmillConfig};
use crate::notify::ApiNotifier;
use crate::pipeline::{BatchSummary, Pipeline};
use crate::source::CsvSource;

#[derive(Args)]
pub struct ProcessArgs {
    /// CSV file with records to analyze
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    /// Number of analysis workers (defaults to all available CPUs)
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// Per-stage timeout for each record in milliseconds
    #[arg(long, value_name = "MS")]
    pub task_timeout_ms: Option<u64>,

    /// Simulated acknowledgment latency in milliseconds
    #[arg(long, value_name = "MS")]
    pub notify_latency_ms: Option<u64>,

    /// CSV column containing the text to analyze
    #[arg(long, value_name = "NAME")]
    pub text_column: Option<String>,

    /// CSV column containing the record identifier
    #[arg(long, value_name = "NAME")]
    pub id_column: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Show per-record outcomes after the summary
    #[arg(long)]
    pub stats: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON format
    Json,
}

pub async fn execute(args: ProcessArgs, config_path: Option<&str>, quiet: bool) -> Result<()> {
    let mut config = WordmillConfig::load(config_path)?;

    // Apply CLI overrides
    if let Some(ms) = args.task_timeout_ms {
        config.task_timeout_ms = ms;
    }
    if let Some(ms) = args.notify_latency_ms {
        config.notify_latency_ms = ms;
    }
    if let Some(column) = &args.text_column {
        config.text_column = column.clone();
    }
    if let Some(column) = &args.id_column {
        config.id_column = column.clone();
    }

    // An explicit --workers value is validated as-is; otherwise the config
    // supplies the request (0 = all cores).
    let requested = args.workers.unwrap_or_else(|| config.requested_workers());
    let effective = EffectiveConfig::resolve(requested)?;
    if let Some(advisory) = effective.advisory() {
        output::warning(&advisory);
    }

    let source = CsvSource::new(&config.text_column, &config.id_column);
    let loaded = source.load(&args.input)?;
    for rejection in &loaded.rejected {
        output::warning(&format!("skipped row at line {}: {}", rejection.line, rejection.message));
    }

    if !quiet {
        output::step(&format!(
            "processing {} records with {} workers",
            loaded.records.len(),
            effective.workers
        ));
    }

    let notifier = ApiNotifier::new(Duration::from_millis(config.notify_latency_ms));
    let pipeline = Pipeline::new(
        effective.workers,
        notifier,
        Duration::from_millis(config.task_timeout_ms),
    );

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            // Signal handling unavailable; never trigger cancellation.
            std::future::pending::<()>().await;
        }
    };
    let summary = pipeline.run_until(loaded.records, shutdown).await;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => print_summary(&summary, loaded.rejected.len(), args.stats, quiet),
    }

    if summary.cancelled > 0 {
        bail!("batch cancelled with {} records unfinished", summary.cancelled);
    }
    if summary.failed > 0 {
        bail!("{} of {} records failed", summary.failed, summary.records);
    }
    Ok(())
}

fn print_summary(summary: &BatchSummary, rejected_rows: usize, stats: bool, quiet: bool) {
    if quiet {
        return;
    }

    output::success(&format!(
        "processed {} records in {:.2}s",
        summary.records,
        summary.duration_ms as f64 / 1000.0
    ));
    output::summary_stats("succeeded", &summary.succeeded.to_string());
    output::summary_stats("failed", &summary.failed.to_string());
    if summary.cancelled > 0 {
        output::summary_stats("cancelled", &summary.cancelled.to_string());
    }
    if rejected_rows > 0 {
        output::summary_stats("rows skipped", &rejected_rows.to_string());
    }
    output::summary_stats("total words", &summary.total_words.to_string());
    output::summary_stats("total rarity", &summary.total_rare_score.to_string());
    output::summary_stats("peak parallel analyses", &summary.peak_parallelism.to_string());

    if stats {
        output::header("Per-record outcomes");
        for outcome in &summary.outcomes {
            match &outcome.outcome {
                Ok(result) => output::list_item(&format!(
                    "{}: {} words, rarity {} (worker {})",
                    outcome.record_id,
                    result.stats.word_count,
                    result.stats.rare_score,
                    result.worker
                )),
                Err(e) => output::list_item(&format!("{}: {}", outcome.record_id, e)),
            }
        }
        output::blank_line();
    }
}
