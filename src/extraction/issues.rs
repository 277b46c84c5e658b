//! Issue aggregator
//!
//! For every clean-code category and tracked severity, counts code smells by
//! the software quality they primarily impact and sums their remediation
//! effort in minutes. The issue search is filtered by category only, so one
//! query per category serves all three severities.

use log::debug;

use crate::extraction::error::{ExtractionError, ExtractionResult, QueryStage};
use crate::extraction::series::{CategoryAggregates, SeverityAggregate};
use crate::extraction::tags::VersionTag;
use crate::extraction::traits::AnalysisBackend;
use crate::parsing::{time_str_to_minutes, MalformedDurationError};
use crate::sonar::model::{CleanCodeCategory, IssueType, RawIssue, Severity, SoftwareQuality};

/// Aggregate code smells whose primary impact has `severity`
pub fn aggregate_issues(
    issues: &[RawIssue],
    severity: Severity,
) -> Result<SeverityAggregate, MalformedDurationError> {
    let mut aggregate = SeverityAggregate::default();

    for issue in issues.iter().filter(|issue| issue.issue_type == IssueType::CodeSmell) {
        let Some(impact) = issue.primary_impact() else {
            continue;
        };
        if impact.severity != severity {
            continue;
        }

        match impact.software_quality {
            SoftwareQuality::Security => aggregate.security_issues += 1,
            SoftwareQuality::Reliability => aggregate.reliability_issues += 1,
            SoftwareQuality::Maintainability => aggregate.maintainability_issues += 1,
            SoftwareQuality::Other => {}
        }
        let effort = issue.debt.as_deref().unwrap_or("");
        aggregate.total_debt = aggregate
            .total_debt
            .checked_add(time_str_to_minutes(effort)?)
            .ok_or_else(|| MalformedDurationError::Overflow {
                input: effort.to_string(),
            })?;
    }

    Ok(aggregate)
}

/// Query every category and aggregate each tracked severity for `tag`
///
/// Nothing is appended here; the caller commits the rows once every stage
/// for the tag has succeeded.
pub fn read_clean_code(
    backend: &dyn AnalysisBackend,
    tag: &VersionTag,
) -> ExtractionResult<Vec<(CleanCodeCategory, CategoryAggregates)>> {
    let mut rows = Vec::with_capacity(CleanCodeCategory::ALL.len());

    for category in CleanCodeCategory::ALL {
        let issues = backend
            .get_issues(category)
            .map_err(|source| ExtractionError::Backend {
                tag: tag.name.clone(),
                stage: QueryStage::Issues,
                source,
            })?;

        let aggregates = Severity::ALL
            .iter()
            .map(|severity| aggregate_issues(&issues, *severity).map(|a| (*severity, a)))
            .collect::<Result<CategoryAggregates, _>>()
            .map_err(|source| ExtractionError::MalformedDuration {
                tag: tag.name.clone(),
                category: category.to_string(),
                source,
            })?;

        debug!(
            "Tag {} {}: {} issues, aggregates {:?}",
            tag.name,
            category,
            issues.len(),
            aggregates
        );
        rows.push((category, aggregates));
    }

    Ok(rows)
}
