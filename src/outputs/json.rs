//! JSON export of a run's [`Report`].
//!
//! Files are named after the local time the report was generated:
//! `{json_output_dir}/sentiment_{YYYYmmdd_HHMMSS}.json`. Infinite ratios are
//! written as the string `"inf"`.

use crate::models::Report;
use chrono::Local;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// File name for a report generated at `report.generated_at`.
pub fn report_filename(report: &Report) -> String {
    let local = report.generated_at.with_timezone(&Local);
    format!("sentiment_{}.json", local.format("%Y%m%d_%H%M%S"))
}

/// Pretty-printed JSON for stdout.
pub fn report_to_json(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Write a [`Report`] into `json_output_dir`, creating the directory if needed.
///
/// Returns the path written.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_report(report: &Report, json_output_dir: &str) -> Result<PathBuf, Box<dyn Error>> {
    let json = report_to_json(report)?;

    if let Err(e) = fs::create_dir_all(json_output_dir).await {
        error!(error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = PathBuf::from(json_output_dir).join(report_filename(report));
    info!(path = %path.display(), "Writing JSON");
    fs::write(&path, json).await?;
    info!(
        path = %path.display(),
        articles = report.articles.len(),
        "Wrote sentiment report"
    );

    Ok(path)
}
