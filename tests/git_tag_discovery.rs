//! Integration tests for tag discovery against real git repositories

use chrono::{TimeZone, Utc};
use git2::{Repository, Signature, Time};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use tagtrend::extraction::{select_tags, ExtractionSettings, TagDiscovery, VersionControl};
use tagtrend::git::{is_git_repository, GitRepository};

/// Seconds for noon UTC on the given day
fn noon(year: i32, month: u32, day: u32) -> i64 {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .unwrap()
        .timestamp()
}

/// Helper to build a repository with one commit per release, each tagged
fn create_tagged_repo(releases: &[(&str, i64)]) -> (TempDir, Repository) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let repo = Repository::init(temp_dir.path()).expect("Failed to init test repository");

    for (index, (tag, seconds)) in releases.iter().enumerate() {
        let signature = Signature::new("Release Bot", "release@example.com", &Time::new(*seconds, 0))
            .expect("Failed to create signature");

        fs::write(temp_dir.path().join("VERSION"), format!("{tag}\n")).expect("Failed to write file");
        let mut index_file = repo.index().expect("Failed to get index");
        index_file.add_path(Path::new("VERSION")).expect("Failed to add file");
        index_file.write().expect("Failed to write index");
        let tree_id = index_file.write_tree().expect("Failed to write tree");
        let tree = repo.find_tree(tree_id).expect("Failed to find tree");

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
            .expect("Failed to commit");

        let commit = repo.find_commit(commit_id).unwrap();
        repo.tag_lightweight(tag, commit.as_object(), false)
            .expect("Failed to create tag");
    }

    drop(repo);
    let repo = Repository::open(temp_dir.path()).unwrap();
    (temp_dir, repo)
}

#[test]
fn test_is_git_repository() {
    let (temp_dir, _repo) = create_tagged_repo(&[("v1.0.0", noon(2020, 1, 1))]);
    assert!(is_git_repository(temp_dir.path()));

    let plain = TempDir::new().unwrap();
    assert!(!is_git_repository(plain.path()));
}

#[test]
fn test_open_rejects_missing_and_bare() {
    let result = GitRepository::open("/definitely/not/a/repo");
    let err_msg = format!("{:?}", result.err().unwrap());
    assert!(err_msg.contains("Path does not exist"));

    let plain = TempDir::new().unwrap();
    let err_msg = format!("{:?}", GitRepository::open(plain.path()).err().unwrap());
    assert!(err_msg.contains("Failed to open repository"));

    let bare_dir = TempDir::new().unwrap();
    Repository::init_bare(bare_dir.path()).unwrap();
    let err_msg = format!("{:?}", GitRepository::open(bare_dir.path()).err().unwrap());
    assert!(err_msg.contains("bare"));
}

#[test]
fn test_discovery_lists_tags_with_commit_dates() {
    let (temp_dir, _repo) = create_tagged_repo(&[
        ("v1.0.0", noon(2019, 3, 1)),
        ("v1.1.0", noon(2019, 9, 15)),
        ("v2.0.0", noon(2020, 2, 29)),
    ]);
    let repository = GitRepository::open(temp_dir.path()).unwrap();

    let tags = TagDiscovery::new(None).discover(&repository).unwrap();

    let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["v1.0.0", "v1.1.0", "v2.0.0"]);
    assert_eq!(tags[0].release_date_string(), "2019-03-01");
    assert_eq!(tags[2].release_date_string(), "2020-02-29");
    assert_eq!(tags[2].timestamp, noon(2020, 2, 29));
}

#[test]
fn test_discovery_truncates_before_sampling() {
    let (temp_dir, _repo) = create_tagged_repo(&[
        ("v1.0.0", noon(2018, 1, 10)),
        ("v1.1.0", noon(2018, 5, 10)),
        ("v1.2.0", noon(2019, 1, 10)),
        ("v1.3.0", noon(2019, 2, 10)),
        ("v1.4.0", noon(2019, 3, 10)),
        ("v2.0.0", noon(2020, 1, 10)),
    ]);
    let repository = GitRepository::open(temp_dir.path()).unwrap();

    let mut settings = ExtractionSettings::new("demo", "http://localhost:9000");
    settings.max_tags = Some(5);
    settings.max_tags_per_year = Some(2);

    let selected = select_tags(&repository, &settings).unwrap();

    // v1.0.0 is cut by truncation, v1.4.0 by the per-year limit
    let names: Vec<&str> = selected.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["v1.1.0", "v1.2.0", "v1.3.0", "v2.0.0"]);
}

#[test]
fn test_release_filter_on_real_tags() {
    let (temp_dir, _repo) = create_tagged_repo(&[
        ("nightly-2020", noon(2020, 6, 1)),
        ("v1.0.0", noon(2020, 1, 1)),
        ("v1.0.1", noon(2020, 2, 1)),
    ]);
    let repository = GitRepository::open(temp_dir.path()).unwrap();

    let tags = TagDiscovery::new(None)
        .with_release_tags_only(true)
        .discover(&repository)
        .unwrap();
    let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["v1.0.0", "v1.0.1"]);
}

#[test]
fn test_checkout_moves_working_copy() {
    let (temp_dir, repo) = create_tagged_repo(&[
        ("v1.0.0", noon(2020, 1, 1)),
        ("v2.0.0", noon(2021, 1, 1)),
    ]);
    let repository = GitRepository::open(temp_dir.path()).unwrap();

    repository.checkout("v1.0.0").unwrap();
    let content = fs::read_to_string(temp_dir.path().join("VERSION")).unwrap();
    assert_eq!(content, "v1.0.0\n");
    assert!(repo.head_detached().unwrap());

    repository.checkout("v2.0.0").unwrap();
    let content = fs::read_to_string(temp_dir.path().join("VERSION")).unwrap();
    assert_eq!(content, "v2.0.0\n");
}

#[test]
fn test_unknown_tag_is_an_error() {
    let (temp_dir, _repo) = create_tagged_repo(&[("v1.0.0", noon(2020, 1, 1))]);
    let repository = GitRepository::open(temp_dir.path()).unwrap();

    assert!(repository.checkout("v9.9.9").is_err());
    assert!(repository.tag_commit_date_and_epoch("v9.9.9").is_err());
}

#[test]
fn test_repository_without_tags() {
    let (temp_dir, _repo) = create_tagged_repo(&[]);
    let repository = GitRepository::open(temp_dir.path()).unwrap();

    let settings = ExtractionSettings::new("demo", "http://localhost:9000");
    assert!(select_tags(&repository, &settings).unwrap().is_empty());
}
