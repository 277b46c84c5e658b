//! Time-series accumulators
//!
//! A [`Series`] is a set of named, equal-length columns. Rows are only ever
//! appended whole, so the columns cannot drift apart: a row that names a
//! column the series lacks, or leaves one out, is rejected before anything
//! is written.

use std::collections::HashMap;
use std::fmt;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use thiserror::Error;

use crate::extraction::tags::VersionTag;
use crate::sonar::model::{CleanCodeCategory, Severity};

/// Index columns of the metric series
pub const METRIC_INDEX_FIELDS: [&str; 3] = ["version", "release_date", "timestamp"];

/// Index columns of each clean-code category series
pub const CLEAN_CODE_INDEX_FIELDS: [&str; 3] = ["version", "date", "timestamp"];

/// A single cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SeriesValue {
    Text(String),
    Integer(i64),
    /// Explicit marker for a value the backend did not report
    Missing,
}

impl SeriesValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            SeriesValue::Integer(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for SeriesValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesValue::Text(text) => write!(f, "{text}"),
            SeriesValue::Integer(value) => write!(f, "{value}"),
            SeriesValue::Missing => Ok(()),
        }
    }
}

impl From<&str> for SeriesValue {
    fn from(value: &str) -> Self {
        SeriesValue::Text(value.to_string())
    }
}

impl From<String> for SeriesValue {
    fn from(value: String) -> Self {
        SeriesValue::Text(value)
    }
}

impl From<i64> for SeriesValue {
    fn from(value: i64) -> Self {
        SeriesValue::Integer(value)
    }
}

impl From<u64> for SeriesValue {
    fn from(value: u64) -> Self {
        SeriesValue::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

/// Row did not fit the series layout
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SeriesError {
    #[error("row is missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("row has unknown columns: {}", .0.join(", "))]
    UnknownColumns(Vec<String>),

    #[error("row values would replace index columns: {}", .0.join(", "))]
    ReservedColumns(Vec<String>),
}

/// Named columns of equal length
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    names: Vec<String>,
    columns: Vec<Vec<SeriesValue>>,
}

impl Series {
    pub fn with_columns<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names_vec: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !names_vec.contains(&name) {
                names_vec.push(name);
            }
        }
        let columns = vec![Vec::new(); names_vec.len()];
        Self { names: names_vec, columns }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&[SeriesValue]> {
        self.position(name).map(|i| self.columns[i].as_slice())
    }

    /// Append one row; every column must be supplied exactly once
    pub fn push_row(&mut self, mut row: HashMap<String, SeriesValue>) -> Result<(), SeriesError> {
        let missing: Vec<String> = self
            .names
            .iter()
            .filter(|name| !row.contains_key(*name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(SeriesError::MissingColumns(missing));
        }

        if row.len() != self.names.len() {
            let mut unknown: Vec<String> = row
                .keys()
                .filter(|key| !self.names.contains(key))
                .cloned()
                .collect();
            unknown.sort();
            return Err(SeriesError::UnknownColumns(unknown));
        }

        for (name, column) in self.names.iter().zip(self.columns.iter_mut()) {
            if let Some(value) = row.remove(name) {
                column.push(value);
            }
        }
        Ok(())
    }

    /// Row `index` in column order
    pub fn row(&self, index: usize) -> Option<Vec<&SeriesValue>> {
        if index >= self.len() {
            return None;
        }
        Some(self.columns.iter().map(|column| &column[index]).collect())
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&SeriesValue>> + '_ {
        (0..self.len()).filter_map(move |i| self.row(i))
    }

    /// Drop rows past `len`
    pub(crate) fn truncate(&mut self, len: usize) {
        for column in &mut self.columns {
            column.truncate(len);
        }
    }

    /// True when every column has the same number of entries
    pub fn is_consistent(&self) -> bool {
        let len = self.len();
        self.columns.iter().all(|column| column.len() == len)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

impl Serialize for Series {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.names.len()))?;
        for (name, column) in self.names.iter().zip(&self.columns) {
            map.serialize_entry(name, column)?;
        }
        map.end()
    }
}

fn index_row(fields: [&str; 3], tag: &VersionTag) -> HashMap<String, SeriesValue> {
    let mut row = HashMap::new();
    row.insert(fields[0].to_string(), SeriesValue::from(tag.name.as_str()));
    row.insert(fields[1].to_string(), SeriesValue::from(tag.release_date_string()));
    row.insert(fields[2].to_string(), SeriesValue::from(tag.timestamp));
    row
}

/// Raw metric values per processed tag
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetricSeries {
    series: Series,
}

impl MetricSeries {
    pub fn new(metric_keys: &[String]) -> Self {
        let names = METRIC_INDEX_FIELDS
            .iter()
            .map(|s| s.to_string())
            .chain(metric_keys.iter().cloned());
        Self {
            series: Series::with_columns(names),
        }
    }

    /// Metric columns, excluding the index fields
    pub fn metric_keys(&self) -> impl Iterator<Item = &str> {
        self.series
            .column_names()
            .iter()
            .skip(METRIC_INDEX_FIELDS.len())
            .map(String::as_str)
    }

    /// Append the tag's index fields together with one value per metric
    pub fn push(
        &mut self,
        tag: &VersionTag,
        values: HashMap<String, SeriesValue>,
    ) -> Result<(), SeriesError> {
        let mut reserved: Vec<String> = values
            .keys()
            .filter(|key| METRIC_INDEX_FIELDS.contains(&key.as_str()))
            .cloned()
            .collect();
        if !reserved.is_empty() {
            reserved.sort();
            return Err(SeriesError::ReservedColumns(reserved));
        }

        let mut row = index_row(METRIC_INDEX_FIELDS, tag);
        row.extend(values);
        self.series.push_row(row)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.series.truncate(len);
    }
}

/// Issue counts and debt for one severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SeverityAggregate {
    pub security_issues: u64,
    pub reliability_issues: u64,
    pub maintainability_issues: u64,
    pub total_debt: u64,
}

impl SeverityAggregate {
    fn columns(severity: Severity) -> [String; 4] {
        let suffix = severity.key();
        [
            format!("security_issues_{suffix}"),
            format!("reliability_issues_{suffix}"),
            format!("maintainability_issues_{suffix}"),
            format!("total_debt_{suffix}"),
        ]
    }

    fn values(&self) -> [u64; 4] {
        [
            self.security_issues,
            self.reliability_issues,
            self.maintainability_issues,
            self.total_debt,
        ]
    }
}

/// One category's aggregates, one entry per tracked severity
pub type CategoryAggregates = Vec<(Severity, SeverityAggregate)>;

/// Per-category series of issue counts and debt by severity
#[derive(Debug, Clone, PartialEq)]
pub struct CleanCodeAttributeSeries {
    categories: Vec<(CleanCodeCategory, Series)>,
}

impl Default for CleanCodeAttributeSeries {
    fn default() -> Self {
        Self::new()
    }
}

impl CleanCodeAttributeSeries {
    pub fn new() -> Self {
        let categories = CleanCodeCategory::ALL
            .iter()
            .map(|category| (*category, Series::with_columns(Self::column_layout())))
            .collect();
        Self { categories }
    }

    fn column_layout() -> Vec<String> {
        let mut names: Vec<String> = CLEAN_CODE_INDEX_FIELDS.iter().map(|s| s.to_string()).collect();
        for severity in Severity::ALL {
            names.extend(SeverityAggregate::columns(severity));
        }
        names
    }

    /// Append one row to every category for `tag`
    ///
    /// `rows` must cover each category exactly once; nothing is written
    /// unless every category's row fits.
    pub fn push_tag(
        &mut self,
        tag: &VersionTag,
        rows: &[(CleanCodeCategory, CategoryAggregates)],
    ) -> Result<(), SeriesError> {
        let mut prepared = Vec::with_capacity(rows.len());
        for (category, aggregates) in rows {
            prepared.push((*category, Self::build_row(tag, aggregates)));
        }

        let missing: Vec<String> = self
            .categories
            .iter()
            .filter(|(c, _)| !prepared.iter().any(|(p, _)| p == c))
            .map(|(c, _)| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SeriesError::MissingColumns(missing));
        }
        if prepared.len() != self.categories.len() {
            return Err(SeriesError::UnknownColumns(
                prepared.iter().map(|(c, _)| c.to_string()).collect(),
            ));
        }

        let layout = Self::column_layout();
        for (_, row) in &prepared {
            let absent: Vec<String> = layout.iter().filter(|n| !row.contains_key(*n)).cloned().collect();
            if !absent.is_empty() {
                return Err(SeriesError::MissingColumns(absent));
            }
            if row.len() != layout.len() {
                let mut unknown: Vec<String> = row.keys().filter(|k| !layout.contains(k)).cloned().collect();
                unknown.sort();
                return Err(SeriesError::UnknownColumns(unknown));
            }
        }

        for (category, row) in prepared {
            if let Some((_, series)) = self.categories.iter_mut().find(|(c, _)| *c == category) {
                series.push_row(row)?;
            }
        }
        Ok(())
    }

    fn build_row(tag: &VersionTag, aggregates: &[(Severity, SeverityAggregate)]) -> HashMap<String, SeriesValue> {
        let mut row = index_row(CLEAN_CODE_INDEX_FIELDS, tag);
        for (severity, aggregate) in aggregates {
            for (name, value) in SeverityAggregate::columns(*severity)
                .into_iter()
                .zip(aggregate.values())
            {
                row.insert(name, SeriesValue::from(value));
            }
        }
        row
    }

    /// Number of rows, taken from the first category
    pub fn len(&self) -> usize {
        self.categories.first().map_or(0, |(_, series)| series.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn category(&self, category: CleanCodeCategory) -> Option<&Series> {
        self.categories
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, series)| series)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CleanCodeCategory, &Series)> {
        self.categories.iter().map(|(c, s)| (*c, s))
    }
}

impl Serialize for CleanCodeAttributeSeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for (category, series) in &self.categories {
            map.serialize_entry(category.as_str(), series)?;
        }
        map.end()
    }
}
