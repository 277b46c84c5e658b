//! Metrics collector

use std::collections::HashMap;

use log::{debug, warn};

use crate::extraction::error::{ExtractionError, ExtractionResult, QueryStage};
use crate::extraction::series::{SeriesValue, METRIC_INDEX_FIELDS};
use crate::extraction::tags::VersionTag;
use crate::extraction::traits::AnalysisBackend;

/// What to do when the backend omits a requested metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingMetricPolicy {
    /// Stop the run with [`ExtractionError::MissingMetric`]
    #[default]
    Fail,
    /// Record [`SeriesValue::Missing`] and carry on
    Pad,
}

/// Default metric keys requested for every tag
pub const DEFAULT_METRIC_KEYS: &[&str] = &[
    // Complexity
    "complexity",
    "cognitive_complexity",
    // Duplication
    "duplicated_blocks",
    "duplicated_files",
    "duplicated_lines",
    "duplicated_lines_density",
    // Issues
    "violations",
    "blocker_violations",
    "critical_violations",
    "major_violations",
    "minor_violations",
    "false_positive_issues",
    // Maintainability
    "code_smells",
    "sqale_index",
    "sqale_rating",
    "sqale_debt_ratio",
    // Reliability
    "bugs",
    "reliability_rating",
    "reliability_remediation_effort",
    // Security
    "vulnerabilities",
    "security_rating",
    "security_remediation_effort",
    "security_hotspots",
    "security_review_rating",
    // Size
    "ncloc",
    "statements",
];

pub fn default_metric_keys() -> Vec<String> {
    DEFAULT_METRIC_KEYS.iter().map(|s| s.to_string()).collect()
}

/// Requested keys that share a name with an index column of the metric series
pub fn reserved_metric_keys(metric_keys: &[String]) -> Vec<&str> {
    metric_keys
        .iter()
        .map(String::as_str)
        .filter(|key| METRIC_INDEX_FIELDS.contains(key))
        .collect()
}

/// Read the current measures for every key in `metric_keys`
///
/// Returns one value per requested key, ready to be appended as a row.
/// Anything else the backend sends is ignored.
pub fn read_metrics(
    backend: &dyn AnalysisBackend,
    component: &str,
    metric_keys: &[String],
    tag: &VersionTag,
    policy: MissingMetricPolicy,
) -> ExtractionResult<HashMap<String, SeriesValue>> {
    let mut measures = backend
        .get_measures(component, metric_keys)
        .map_err(|source| ExtractionError::Backend {
            tag: tag.name.clone(),
            stage: QueryStage::Measures,
            source,
        })?;

    let mut values = HashMap::with_capacity(metric_keys.len());
    let mut missing = Vec::new();
    for key in metric_keys {
        match measures.remove(key) {
            Some(value) => {
                values.insert(key.clone(), SeriesValue::Text(value));
            }
            None => {
                missing.push(key.clone());
                values.insert(key.clone(), SeriesValue::Missing);
            }
        }
    }

    if !missing.is_empty() {
        match policy {
            MissingMetricPolicy::Fail => {
                return Err(ExtractionError::MissingMetric {
                    tag: tag.name.clone(),
                    metrics: missing,
                });
            }
            MissingMetricPolicy::Pad => {
                warn!(
                    "Tag {}: backend reported no value for {}; recorded as missing",
                    tag.name,
                    missing.join(", ")
                );
            }
        }
    }

    debug!("Read {} metrics for tag {}", values.len(), tag.name);
    Ok(values)
}
