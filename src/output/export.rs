//! CSV and JSON export of extraction results

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::extraction::pipeline::{ExtractionRun, TagStage};
use crate::extraction::series::{CleanCodeAttributeSeries, MetricSeries, Series};
use crate::extraction::tags::VersionTag;
use crate::output::summary::{debt_summary, CategoryDebt, ControlLimits};

pub const METRICS_FILE: &str = "metrics.csv";
pub const JSON_FILE: &str = "extraction.json";
pub const DEBT_SUMMARY_FILE: &str = "debt_summary.csv";

const DELIMITER: char = ',';
const QUOTE: char = '"';

/// Quote a field when it holds the delimiter, a quote or a line break
pub fn escape_csv_field(value: &str) -> String {
    if value.contains(DELIMITER) || value.contains(QUOTE) || value.contains('\n') || value.contains('\r') {
        format!("{QUOTE}{}{QUOTE}", value.replace(QUOTE, "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_line<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = fields
        .into_iter()
        .map(|f| escape_csv_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(&DELIMITER.to_string());
    line.push('\n');
    line
}

/// Header plus one line per row, columns in series order
pub fn series_to_csv(series: &Series) -> String {
    let mut content = csv_line(series.column_names());
    for row in series.rows() {
        content.push_str(&csv_line(row.iter().map(|v| v.to_string())));
    }
    content
}

/// One line per release per category
pub fn debt_summary_to_csv(summary: &[CategoryDebt]) -> String {
    let mut content = csv_line([
        "category",
        "version",
        "date",
        "timestamp",
        "total_debt_low",
        "total_debt_medium",
        "total_debt_high",
        "total_debt",
        "debt_change",
    ]);
    for category in summary {
        for point in &category.points {
            content.push_str(&csv_line([
                category.category.file_stem(),
                point.version.clone(),
                point.date.clone(),
                point.timestamp.to_string(),
                point.debt_low.to_string(),
                point.debt_medium.to_string(),
                point.debt_high.to_string(),
                point.total_debt.to_string(),
                point.change.to_string(),
            ]));
        }
    }
    content
}

#[derive(Serialize)]
struct FailureReport<'a> {
    tag: &'a str,
    stage: String,
    error: String,
}

#[derive(Serialize)]
struct ExtractionDocument<'a> {
    complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<FailureReport<'a>>,
    selected: Vec<&'a str>,
    processed: &'a [VersionTag],
    metrics: &'a MetricSeries,
    clean_code: &'a CleanCodeAttributeSeries,
    control_limits: Vec<(String, Option<ControlLimits>)>,
}

/// Both datasets in column form, with a completeness marker
pub fn run_to_json(run: &ExtractionRun, summary: &[CategoryDebt]) -> Result<String> {
    let failure = run.failure.as_ref().map(|f| FailureReport {
        tag: &f.tag,
        stage: stage_name(f.stage),
        error: f.error.to_string(),
    });

    let document = ExtractionDocument {
        complete: run.is_complete(),
        failure,
        selected: run.selected.iter().map(|t| t.name.as_str()).collect(),
        processed: &run.output.processed,
        metrics: &run.output.metrics,
        clean_code: &run.output.clean_code,
        control_limits: summary
            .iter()
            .map(|c| (c.category.as_str().to_string(), c.limits))
            .collect(),
    };

    serde_json::to_string_pretty(&document).context("Failed to serialize extraction results")
}

fn stage_name(stage: TagStage) -> String {
    stage.to_string().replace(' ', "_")
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    debug!("Wrote {} ({} bytes)", path.display(), content.len());
    Ok(())
}

/// Write every export file into `directory`, creating it if needed
///
/// Partial runs are exported too; the JSON document carries the failure.
pub fn export_run(run: &ExtractionRun, directory: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create output directory {}", directory.display()))?;

    let mut written = Vec::new();

    let path = directory.join(METRICS_FILE);
    write_file(&path, &series_to_csv(run.output.metrics.series()))?;
    written.push(path);

    for (category, series) in run.output.clean_code.iter() {
        let path = directory.join(format!("{}.csv", category.file_stem()));
        write_file(&path, &series_to_csv(series))?;
        written.push(path);
    }

    let summary = debt_summary(&run.output.clean_code);
    let path = directory.join(DEBT_SUMMARY_FILE);
    write_file(&path, &debt_summary_to_csv(&summary))?;
    written.push(path);

    let path = directory.join(JSON_FILE);
    write_file(&path, &run_to_json(run, &summary)?)?;
    written.push(path);

    info!("Exported {} files to {}", written.len(), directory.display());
    Ok(written)
}
