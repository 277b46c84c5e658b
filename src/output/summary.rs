//! Debt summary and control limits
//!
//! Per category, releases are ordered by date and each gets its total debt
//! (low + medium + high) and the change from the release before it. The
//! first release's change is its own total.

use serde::Serialize;

use crate::extraction::series::{CleanCodeAttributeSeries, Series, SeriesValue};
use crate::parsing::normalize_version_label;
use crate::sonar::model::{CleanCodeCategory, Severity};

/// Width of the control band in standard deviations
pub const CONTROL_SIGMA: f64 = 3.0;

/// One release's debt in one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebtPoint {
    pub version: String,
    pub date: String,
    pub timestamp: i64,
    pub debt_low: i64,
    pub debt_medium: i64,
    pub debt_high: i64,
    pub total_debt: i64,
    pub change: i64,
}

/// Debt history of one category, ordered by release date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDebt {
    pub category: CleanCodeCategory,
    pub points: Vec<DebtPoint>,
    pub limits: Option<ControlLimits>,
}

/// Shewhart limits around the mean
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControlLimits {
    pub mean: f64,
    pub std_dev: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ControlLimits {
    /// Whether `value` lies outside the band
    pub fn is_out_of_control(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}

/// Mean, sample standard deviation and mean ± 3σ
///
/// `None` with fewer than two values, where the sample deviation is undefined.
pub fn control_limits(values: &[f64]) -> Option<ControlLimits> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();

    Some(ControlLimits {
        mean,
        std_dev,
        lower: mean - CONTROL_SIGMA * std_dev,
        upper: mean + CONTROL_SIGMA * std_dev,
    })
}

/// Debt history and control limits for every category
pub fn debt_summary(series: &CleanCodeAttributeSeries) -> Vec<CategoryDebt> {
    series
        .iter()
        .map(|(category, rows)| {
            let points = category_points(rows);
            let totals: Vec<f64> = points.iter().map(|p| p.total_debt as f64).collect();
            CategoryDebt {
                category,
                limits: control_limits(&totals),
                points,
            }
        })
        .collect()
}

fn category_points(rows: &Series) -> Vec<DebtPoint> {
    let text = |name: &str, i: usize| {
        rows.column(name)
            .and_then(|c| c.get(i))
            .map(SeriesValue::to_string)
            .unwrap_or_default()
    };
    let integer = |name: &str, i: usize| {
        rows.column(name)
            .and_then(|c| c.get(i))
            .and_then(SeriesValue::as_integer)
            .unwrap_or(0)
    };
    let debt_column = |severity: Severity| format!("total_debt_{}", severity.key());

    let mut points: Vec<DebtPoint> = (0..rows.len())
        .map(|i| {
            let debt_low = integer(&debt_column(Severity::Low), i);
            let debt_medium = integer(&debt_column(Severity::Medium), i);
            let debt_high = integer(&debt_column(Severity::High), i);
            DebtPoint {
                version: normalize_version_label(&text("version", i)),
                date: text("date", i),
                timestamp: integer("timestamp", i),
                debt_low,
                debt_medium,
                debt_high,
                total_debt: debt_low + debt_medium + debt_high,
                change: 0,
            }
        })
        .collect();

    // Stable, so releases sharing a date keep extraction order
    points.sort_by(|a, b| a.date.cmp(&b.date));

    let mut previous = None;
    for point in &mut points {
        point.change = match previous {
            Some(prev) => point.total_debt - prev,
            None => point.total_debt,
        };
        previous = Some(point.total_debt);
    }
    points
}
