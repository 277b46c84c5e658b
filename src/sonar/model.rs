//! SonarQube Web API data types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Clean-code attribute categories issues are classified under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CleanCodeCategory {
    Responsible,
    Adaptable,
    Consistent,
    Intentional,
}

impl CleanCodeCategory {
    pub const ALL: [CleanCodeCategory; 4] = [
        CleanCodeCategory::Responsible,
        CleanCodeCategory::Adaptable,
        CleanCodeCategory::Consistent,
        CleanCodeCategory::Intentional,
    ];

    /// Name used in API queries
    pub fn as_str(&self) -> &'static str {
        match self {
            CleanCodeCategory::Responsible => "RESPONSIBLE",
            CleanCodeCategory::Adaptable => "ADAPTABLE",
            CleanCodeCategory::Consistent => "CONSISTENT",
            CleanCodeCategory::Intentional => "INTENTIONAL",
        }
    }

    /// Lower-case name used for output file names
    pub fn file_stem(&self) -> String {
        self.as_str().to_lowercase()
    }
}

impl fmt::Display for CleanCodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Impact severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    /// Severities outside the three tracked ones (e.g. INFO, BLOCKER)
    #[serde(other)]
    Other,
}

impl Severity {
    /// Severities that get their own columns
    pub const ALL: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

    /// Lower-case column suffix
    pub fn key(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Other => "other",
        }
    }
}

/// Software quality an issue impacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SoftwareQuality {
    Security,
    Reliability,
    Maintainability,
    #[serde(other)]
    Other,
}

/// Legacy issue type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    CodeSmell,
    Bug,
    Vulnerability,
    SecurityHotspot,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Impact {
    pub software_quality: SoftwareQuality,
    pub severity: Severity,
}

/// One issue as returned by `/api/issues/search`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawIssue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    #[serde(default)]
    pub impacts: Vec<Impact>,
    /// Remediation effort such as "1h 30min"; absent means no effort recorded
    #[serde(default)]
    pub debt: Option<String>,
}

impl RawIssue {
    /// The first listed impact is the primary one
    pub fn primary_impact(&self) -> Option<&Impact> {
        self.impacts.first()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Measure {
    pub metric: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeasuresComponent {
    #[serde(default)]
    pub measures: Vec<Measure>,
}

/// Body of `/api/measures/component`
#[derive(Debug, Clone, Deserialize)]
pub struct MeasuresResponse {
    pub component: MeasuresComponent,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    pub page_index: u32,
    pub page_size: u32,
    pub total: u32,
}

/// Body of `/api/issues/search`
#[derive(Debug, Clone, Deserialize)]
pub struct IssuesResponse {
    #[serde(default)]
    pub paging: Option<Paging>,
    #[serde(default)]
    pub issues: Vec<RawIssue>,
}
