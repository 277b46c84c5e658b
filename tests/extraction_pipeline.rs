//! End-to-end extraction over a real repository with a scripted scanner and server

use anyhow::Result;
use chrono::{TimeZone, Utc};
use git2::{Repository, Signature, Time};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use tagtrend::extraction::{
    AnalysisBackend, ExtractionSettings, Extractor, ScanRequest, ScanRunner, TagStage,
};
use tagtrend::git::GitRepository;
use tagtrend::output::{debt_summary, export_run};
use tagtrend::sonar::model::{
    CleanCodeCategory, Impact, IssueType, RawIssue, Severity, SoftwareQuality,
};
use tagtrend::sonar::BackendError;

fn noon(year: i32, month: u32, day: u32) -> i64 {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .unwrap()
        .timestamp()
}

/// Helper to build a repository whose VERSION file names the tag it is tagged with
fn create_release_repo(releases: &[(&str, i64)]) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let repo = Repository::init(temp_dir.path()).expect("Failed to init test repository");

    for (index, (tag, seconds)) in releases.iter().enumerate() {
        let signature = Signature::new("Release Bot", "release@example.com", &Time::new(*seconds, 0))
            .expect("Failed to create signature");

        fs::write(temp_dir.path().join("VERSION"), *tag).expect("Failed to write file");
        let mut index_file = repo.index().unwrap();
        index_file.add_path(Path::new("VERSION")).unwrap();
        index_file.write().unwrap();
        let tree = repo.find_tree(index_file.write_tree().unwrap()).unwrap();

        let parents = if index == 0 {
            vec![]
        } else {
            vec![repo.head().unwrap().peel_to_commit().unwrap()]
        };
        let commit_id = repo
            .commit(
                Some("HEAD"),
                &signature,
                &signature,
                &format!("Release {tag}"),
                &tree,
                &parents.iter().collect::<Vec<_>>(),
            )
            .unwrap();
        let commit = repo.find_commit(commit_id).unwrap();
        repo.tag_lightweight(tag, commit.as_object(), false).unwrap();
    }

    temp_dir
}

/// Records what the working copy held each time a scan ran
#[derive(Default)]
struct RecordingScanner {
    scans: RefCell<Vec<(String, String)>>,
}

impl ScanRunner for RecordingScanner {
    fn run_scan(&self, request: &ScanRequest<'_>) -> Result<()> {
        let content = fs::read_to_string(request.base_dir.join("VERSION"))?;
        self.scans
            .borrow_mut()
            .push((request.project_version.to_string(), content));
        Ok(())
    }
}

/// Answers measures with the call number and issues from a fixed table
struct ScriptedServer {
    measure_calls: RefCell<usize>,
    issue_calls: RefCell<usize>,
    issues: HashMap<CleanCodeCategory, Vec<RawIssue>>,
    fail_issues_on_call: Option<usize>,
}

impl ScriptedServer {
    fn new() -> Self {
        let mut issues = HashMap::new();
        issues.insert(
            CleanCodeCategory::Adaptable,
            vec![
                smell(SoftwareQuality::Maintainability, Severity::High, "1h 0min"),
                smell(SoftwareQuality::Reliability, Severity::Low, "15min"),
                RawIssue {
                    issue_type: IssueType::Bug,
                    impacts: vec![Impact {
                        software_quality: SoftwareQuality::Reliability,
                        severity: Severity::High,
                    }],
                    debt: Some("2h".to_string()),
                },
            ],
        );
        issues.insert(
            CleanCodeCategory::Intentional,
            vec![smell(SoftwareQuality::Security, Severity::Medium, "1d 0h 0min")],
        );
        Self {
            measure_calls: RefCell::new(0),
            issue_calls: RefCell::new(0),
            issues,
            fail_issues_on_call: None,
        }
    }

    fn failing_issues_on_call(mut self, call: usize) -> Self {
        self.fail_issues_on_call = Some(call);
        self
    }
}

fn smell(quality: SoftwareQuality, severity: Severity, debt: &str) -> RawIssue {
    RawIssue {
        issue_type: IssueType::CodeSmell,
        impacts: vec![Impact {
            software_quality: quality,
            severity,
        }],
        debt: Some(debt.to_string()),
    }
}

impl AnalysisBackend for ScriptedServer {
    fn get_measures(
        &self,
        _component: &str,
        metric_keys: &[String],
    ) -> Result<HashMap<String, String>, BackendError> {
        let mut calls = self.measure_calls.borrow_mut();
        *calls += 1;
        Ok(metric_keys
            .iter()
            .map(|key| (key.clone(), format!("{}", *calls * 100)))
            .collect())
    }

    fn get_issues(&self, category: CleanCodeCategory) -> Result<Vec<RawIssue>, BackendError> {
        let mut calls = self.issue_calls.borrow_mut();
        *calls += 1;
        if self.fail_issues_on_call == Some(*calls) {
            return Err(BackendError::Status {
                url: "http://sonar.test/api/issues/search".to_string(),
                status: 503,
                body: "maintenance".to_string(),
            });
        }
        Ok(self.issues.get(&category).cloned().unwrap_or_default())
    }
}

fn settings() -> ExtractionSettings {
    let mut settings = ExtractionSettings::new("demo", "http://sonar.test");
    settings.metric_keys = vec!["ncloc".to_string(), "code_smells".to_string()];
    settings
}

#[test]
fn test_full_run_scans_each_tag_at_its_revision() {
    let repo_dir = create_release_repo(&[
        ("v1.0.0", noon(2020, 1, 15)),
        ("v1.1.0", noon(2020, 7, 1)),
        ("v2.0.0", noon(2021, 3, 3)),
    ]);
    let repository = GitRepository::open(repo_dir.path()).unwrap();
    let scanner = RecordingScanner::default();
    let server = ScriptedServer::new();

    let run = Extractor::new(&repository, &scanner, &server, settings()).run().unwrap();

    assert!(run.is_complete());
    assert_eq!(run.output.processed.len(), 3);
    assert_eq!(run.output.metrics.len(), 3);
    assert_eq!(run.output.clean_code.len(), 3);

    let scans = scanner.scans.borrow();
    assert_eq!(
        *scans,
        vec![
            ("v1.0.0".to_string(), "v1.0.0".to_string()),
            ("v1.1.0".to_string(), "v1.1.0".to_string()),
            ("v2.0.0".to_string(), "v2.0.0".to_string()),
        ]
    );
}

#[test]
fn test_debt_summary_from_run() {
    let repo_dir = create_release_repo(&[
        ("v1.0.0", noon(2020, 1, 15)),
        ("v2.0.0", noon(2021, 3, 3)),
    ]);
    let repository = GitRepository::open(repo_dir.path()).unwrap();
    let scanner = RecordingScanner::default();
    let server = ScriptedServer::new();

    let run = Extractor::new(&repository, &scanner, &server, settings()).run().unwrap();
    let summary = debt_summary(&run.output.clean_code);

    let adaptable = summary
        .iter()
        .find(|c| c.category == CleanCodeCategory::Adaptable)
        .unwrap();
    // 1h high + 15min low; the bug is not a code smell
    assert_eq!(adaptable.points[0].debt_high, 60);
    assert_eq!(adaptable.points[0].debt_low, 15);
    assert_eq!(adaptable.points[0].total_debt, 75);
    assert_eq!(adaptable.points[0].change, 75);
    assert_eq!(adaptable.points[1].change, 0);

    let intentional = summary
        .iter()
        .find(|c| c.category == CleanCodeCategory::Intentional)
        .unwrap();
    assert_eq!(intentional.points[0].debt_medium, 1440);

    let responsible = summary
        .iter()
        .find(|c| c.category == CleanCodeCategory::Responsible)
        .unwrap();
    assert!(responsible.points.iter().all(|p| p.total_debt == 0));
}

#[test]
fn test_export_of_complete_run() {
    let repo_dir = create_release_repo(&[
        ("v1.0.0", noon(2020, 1, 15)),
        ("v2.0.0", noon(2021, 3, 3)),
    ]);
    let repository = GitRepository::open(repo_dir.path()).unwrap();
    let scanner = RecordingScanner::default();
    let server = ScriptedServer::new();
    let run = Extractor::new(&repository, &scanner, &server, settings()).run().unwrap();

    let output_dir = TempDir::new().unwrap();
    let written = export_run(&run, output_dir.path()).unwrap();
    assert_eq!(written.len(), 7);

    for name in [
        "metrics.csv",
        "responsible.csv",
        "adaptable.csv",
        "consistent.csv",
        "intentional.csv",
        "debt_summary.csv",
        "extraction.json",
    ] {
        assert!(output_dir.path().join(name).exists(), "{name} was not written");
    }

    let metrics = fs::read_to_string(output_dir.path().join("metrics.csv")).unwrap();
    let lines: Vec<&str> = metrics.lines().collect();
    assert_eq!(lines[0], "version,release_date,timestamp,ncloc,code_smells");
    assert!(lines[1].starts_with("v1.0.0,2020-01-15,"));
    assert!(lines[2].ends_with(",200,200"));

    let summary = fs::read_to_string(output_dir.path().join("debt_summary.csv")).unwrap();
    assert!(summary.contains("adaptable,v1.0.0,2020-01-15,"));

    let json: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(output_dir.path().join("extraction.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(json["complete"], serde_json::Value::Bool(true));
    assert!(json.get("failure").is_none());
    assert_eq!(json["metrics"]["version"][1], "v2.0.0");
    assert_eq!(json["clean_code"]["ADAPTABLE"]["total_debt_high"][0], 60);
}

#[test]
fn test_backend_failure_keeps_earlier_tags() {
    let repo_dir = create_release_repo(&[
        ("v1.0.0", noon(2020, 1, 15)),
        ("v1.1.0", noon(2020, 7, 1)),
        ("v2.0.0", noon(2021, 3, 3)),
    ]);
    let repository = GitRepository::open(repo_dir.path()).unwrap();
    let scanner = RecordingScanner::default();
    // Four category queries per tag; call 6 lands inside the second tag
    let server = ScriptedServer::new().failing_issues_on_call(6);

    let run = Extractor::new(&repository, &scanner, &server, settings()).run().unwrap();

    assert!(!run.is_complete());
    assert_eq!(run.selected.len(), 3);
    assert_eq!(run.output.processed.len(), 1);
    assert_eq!(run.output.metrics.len(), 1);
    assert_eq!(run.output.clean_code.len(), 1);

    let failure = run.failure.as_ref().unwrap();
    assert_eq!(failure.tag, "v1.1.0");
    assert_eq!(failure.stage, TagStage::Collected);
    assert_eq!(scanner.scans.borrow().len(), 2);

    let output_dir = TempDir::new().unwrap();
    export_run(&run, output_dir.path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(output_dir.path().join("extraction.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(json["complete"], serde_json::Value::Bool(false));
    assert_eq!(json["failure"]["tag"], "v1.1.0");
    assert_eq!(json["failure"]["stage"], "collected");
    assert_eq!(json["selected"].as_array().unwrap().len(), 3);
}
