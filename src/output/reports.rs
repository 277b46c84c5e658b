//! Report generation and formatting

use prettytable::{Table, Row, Cell, format};

use crate::extraction::pipeline::ExtractionRun;
use crate::extraction::tags::VersionTag;
use crate::output::summary::CategoryDebt;

/// Format a compact table with headers and rows using prettytable-rs clean format
pub fn format_compact_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);

    let header_cells: Vec<Cell> = headers.iter()
        .map(|header| Cell::new(header))
        .collect();
    table.add_row(Row::new(header_cells));

    for row in rows {
        let data_cells: Vec<Cell> = row.iter()
            .map(|cell| Cell::new(cell))
            .collect();
        table.add_row(Row::new(data_cells));
    }

    // 2-space indent
    let table_output = table.to_string();
    let mut result = String::new();
    for line in table_output.lines() {
        result.push_str("  ");
        result.push_str(line);
        result.push('\n');
    }

    result
}

/// Selected tags, one per line, with release date and epoch time
pub fn format_tag_table(tags: &[VersionTag]) -> String {
    let rows: Vec<Vec<String>> = tags.iter()
        .map(|tag| vec![
            tag.name.clone(),
            tag.release_date_string(),
            tag.timestamp.to_string(),
        ])
        .collect();
    format_compact_table(&["Tag", "Released", "Timestamp"], &rows)
}

/// Mean, σ and control band per category
pub fn format_control_limits(summary: &[CategoryDebt]) -> String {
    let rows: Vec<Vec<String>> = summary.iter()
        .map(|category| {
            let latest = category.points.last().map(|p| p.total_debt);
            let mut row = vec![
                category.category.to_string(),
                category.points.len().to_string(),
                latest.map_or_else(|| "-".to_string(), |d| d.to_string()),
            ];
            match &category.limits {
                Some(limits) => {
                    row.push(format!("{:.1}", limits.mean));
                    row.push(format!("{:.1}", limits.std_dev));
                    row.push(format!("{:.1}", limits.lower));
                    row.push(format!("{:.1}", limits.upper));
                    let flagged = category.points.iter()
                        .filter(|p| limits.is_out_of_control(p.total_debt as f64))
                        .count();
                    row.push(flagged.to_string());
                }
                None => row.extend(std::iter::repeat("-".to_string()).take(5)),
            }
            row
        })
        .collect();
    format_compact_table(
        &["Category", "Releases", "Latest debt", "Mean", "Std dev", "LCL", "UCL", "Outside"],
        &rows,
    )
}

/// One-paragraph outcome of a run
pub fn format_run_summary(run: &ExtractionRun) -> String {
    let mut text = format!(
        "Processed {} of {} selected tags\n",
        run.output.processed.len(),
        run.selected.len()
    );
    if let Some(failure) = &run.failure {
        text.push_str(&format!(
            "Stopped at tag {} after stage '{}': {}\n",
            failure.tag, failure.stage, failure.error
        ));
    }
    text
}
