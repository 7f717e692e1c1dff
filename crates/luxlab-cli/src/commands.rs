//! Command handlers for the CLI.
//!
//! Conversions run in the current process against the configured export
//! directory; progress goes to stdout, logs to stderr.

use std::sync::Mutex;

use luxlab_core::{AppConfig, Plan, PricingStrategy, ProgressSink, ProgressUpdate};
use luxlab_jobs::{AnalysisPreview, ConversionOutcome, ConversionRequest, ConversionRunner};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Prints one line per phase change or percentage step.
#[derive(Debug, Default)]
pub(crate) struct ConsoleSink {
    last: Mutex<Option<(luxlab_core::JobPhase, u8)>>,
}

impl ProgressSink for ConsoleSink {
    fn emit(&self, update: ProgressUpdate) {
        let key = (update.phase, update.progress);
        let mut last = self
            .last
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if *last == Some(key) {
            return;
        }
        *last = Some(key);
        drop(last);
        println!("{}", progress_line(&update));
    }
}

pub(crate) fn progress_line(update: &ProgressUpdate) -> String {
    format!(
        "[{:>3}%] {:<10} {}",
        update.progress,
        update.phase.as_str(),
        update.message
    )
}

/// Runs one conversion and prints where the workbook landed.
///
/// Ctrl-C cancels the job; the partial work is discarded.
///
/// # Errors
///
/// Returns an error if the runner cannot be built from `config` or the job
/// fails or is cancelled.
pub(crate) async fn run_convert(
    config: &AppConfig,
    url: String,
    strategy: PricingStrategy,
    custom_margin: Option<f64>,
    plan: Plan,
) -> anyhow::Result<()> {
    let runner = ConversionRunner::from_app_config(config)?;
    let job_id = Uuid::new_v4();
    let cancel = CancellationToken::new();
    let sink = ConsoleSink::default();

    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling conversion");
            on_ctrl_c.cancel();
        }
    });

    tracing::info!(job_id = %job_id, plan = plan.as_str(), "starting conversion");
    let request = ConversionRequest {
        url,
        strategy,
        custom_margin,
    };
    let outcome = runner
        .run(job_id, &request, plan.entitlements(), &sink, &cancel)
        .await?;

    println!("{}", summary_text(config, &outcome));
    Ok(())
}

pub(crate) fn summary_text(config: &AppConfig, outcome: &ConversionOutcome) -> String {
    let summary = &outcome.summary;
    let mut text = format!(
        "workbook:   {}\nstrategy:   {}\nproducts:   {}\nretail:     EUR {:.2}\nproposed:   EUR {:.2}\navg saving: {:.1}%",
        config.export_dir.join(&outcome.filename).display(),
        outcome.strategy.as_str(),
        summary.products_count,
        summary.total_retail,
        summary.total_proposed,
        summary.margin_avg,
    );
    if let Some(insights) = &outcome.insights {
        if let Some(recommended) = insights.recommended {
            text.push_str(&format!(
                "\nmarket:     {} sampled, recommends {}",
                insights.products_sampled,
                recommended.as_str()
            ));
        }
    }
    text
}

/// Prints the first entries of `url` as JSON.
///
/// # Errors
///
/// Returns an error if the runner cannot be built or the page yields no
/// entries.
pub(crate) async fn run_analyze(config: &AppConfig, url: &str, plan: Plan) -> anyhow::Result<()> {
    let runner = ConversionRunner::from_app_config(config)?;
    let preview = runner.analyze(url, plan.entitlements()).await?;
    println!("{}", preview_text(&preview)?);
    Ok(())
}

pub(crate) fn preview_text(preview: &AnalysisPreview) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(preview)?)
}
