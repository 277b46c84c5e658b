//! In-memory fakes of the collaborator traits

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;

use crate::extraction::traits::{AnalysisBackend, ScanRequest, ScanRunner, VersionControl};
use crate::sonar::model::{CleanCodeCategory, Impact, IssueType, RawIssue, Severity, SoftwareQuality};
use crate::sonar::BackendError;

/// Shared, ordered record of calls across fakes
pub type EventLog = Rc<RefCell<Vec<String>>>;

pub fn events() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

fn record(log: &Option<EventLog>, event: String) {
    if let Some(log) = log {
        log.borrow_mut().push(event);
    }
}

pub struct FakeRepository {
    path: PathBuf,
    tags: Vec<(String, Option<(NaiveDate, i64)>)>,
    listing_fails: bool,
    failing_checkouts: HashSet<String>,
    events: Option<EventLog>,
}

impl FakeRepository {
    pub fn new() -> Self {
        Self {
            path: PathBuf::from("/fake/repo"),
            tags: Vec::new(),
            listing_fails: false,
            failing_checkouts: HashSet::new(),
            events: None,
        }
    }

    pub fn with_tag(mut self, name: &str, date: NaiveDate, timestamp: i64) -> Self {
        self.tags.push((name.to_string(), Some((date, timestamp))));
        self
    }

    pub fn with_undated_tag(mut self, name: &str) -> Self {
        self.tags.push((name.to_string(), None));
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.listing_fails = true;
        self
    }

    pub fn failing_checkout(mut self, tag: &str) -> Self {
        self.failing_checkouts.insert(tag.to_string());
        self
    }

    pub fn with_events(mut self, log: EventLog) -> Self {
        self.events = Some(log);
        self
    }
}

impl VersionControl for FakeRepository {
    fn location(&self) -> &Path {
        &self.path
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        if self.listing_fails {
            return Err(anyhow!("not a git repository"));
        }
        Ok(self.tags.iter().map(|(name, _)| name.clone()).collect())
    }

    fn tag_commit_date_and_epoch(&self, tag: &str) -> Result<(NaiveDate, i64)> {
        self.tags
            .iter()
            .find(|(name, _)| name == tag)
            .and_then(|(_, meta)| *meta)
            .ok_or_else(|| anyhow!("no commit metadata for {tag}"))
    }

    fn checkout(&self, tag: &str) -> Result<()> {
        record(&self.events, format!("checkout:{tag}"));
        if self.failing_checkouts.contains(tag) {
            return Err(anyhow!("pathspec '{tag}' did not match"));
        }
        Ok(())
    }
}

pub struct FakeScanner {
    failing_versions: HashSet<String>,
    events: Option<EventLog>,
}

impl FakeScanner {
    pub fn new() -> Self {
        Self {
            failing_versions: HashSet::new(),
            events: None,
        }
    }

    pub fn failing_on(mut self, version: &str) -> Self {
        self.failing_versions.insert(version.to_string());
        self
    }

    pub fn with_events(mut self, log: EventLog) -> Self {
        self.events = Some(log);
        self
    }
}

impl ScanRunner for FakeScanner {
    fn run_scan(&self, request: &ScanRequest<'_>) -> Result<()> {
        record(
            &self.events,
            format!("scan:{}@{}", request.project_key, request.project_version),
        );
        if self.failing_versions.contains(request.project_version) {
            return Err(anyhow!("scanner exited with status 2"));
        }
        Ok(())
    }
}

pub struct FakeBackend {
    measures: HashMap<String, String>,
    issues: HashMap<CleanCodeCategory, Vec<RawIssue>>,
    measure_calls: Cell<usize>,
    fail_measures_on_call: Option<usize>,
    events: Option<EventLog>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            measures: HashMap::new(),
            issues: HashMap::new(),
            measure_calls: Cell::new(0),
            fail_measures_on_call: None,
            events: None,
        }
    }

    pub fn with_measure(mut self, key: &str, value: &str) -> Self {
        self.measures.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_measures(mut self, keys: &[String], value: &str) -> Self {
        for key in keys {
            self.measures.insert(key.clone(), value.to_string());
        }
        self
    }

    pub fn with_issues(mut self, category: CleanCodeCategory, issues: Vec<RawIssue>) -> Self {
        self.issues.insert(category, issues);
        self
    }

    /// The n-th measures query (1-based) fails with a server error
    pub fn failing_measures_on_call(mut self, call: usize) -> Self {
        self.fail_measures_on_call = Some(call);
        self
    }

    pub fn with_events(mut self, log: EventLog) -> Self {
        self.events = Some(log);
        self
    }
}

impl AnalysisBackend for FakeBackend {
    fn get_measures(
        &self,
        component: &str,
        metric_keys: &[String],
    ) -> Result<HashMap<String, String>, BackendError> {
        record(&self.events, "measures".to_string());
        let call = self.measure_calls.get() + 1;
        self.measure_calls.set(call);
        if self.fail_measures_on_call == Some(call) {
            return Err(BackendError::Status {
                url: format!("http://fake/api/measures/component?component={component}"),
                status: 500,
                body: "internal error".to_string(),
            });
        }
        Ok(metric_keys
            .iter()
            .filter_map(|key| self.measures.get(key).map(|v| (key.clone(), v.clone())))
            .collect())
    }

    fn get_issues(&self, category: CleanCodeCategory) -> Result<Vec<RawIssue>, BackendError> {
        record(&self.events, format!("issues:{}", category.as_str()));
        Ok(self.issues.get(&category).cloned().unwrap_or_default())
    }
}

/// A single-impact issue
pub fn issue(
    issue_type: IssueType,
    quality: SoftwareQuality,
    severity: Severity,
    debt: Option<&str>,
) -> RawIssue {
    RawIssue {
        issue_type,
        impacts: vec![Impact {
            software_quality: quality,
            severity,
        }],
        debt: debt.map(str::to_string),
    }
}
