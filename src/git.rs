use git2::{build::CheckoutBuilder, Commit, Repository};
use anyhow::{Result, Context};
use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
use std::path::{Path, PathBuf};
use log::{debug, info, error};

use crate::extraction::traits::VersionControl;

/// Check if the given path is a git repository
pub fn is_git_repository<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    debug!("Checking if path is git repository: {}", path.display());

    match Repository::open(path) {
        Ok(_) => {
            debug!("Git repository detected at: {}", path.display());
            true
        }
        Err(e) => {
            debug!("Not a git repository at {}: {}", path.display(), e);
            false
        }
    }
}

/// A git working copy that tags are listed from and checked out into
pub struct GitRepository {
    repository: Repository,
    path: PathBuf,
}

impl GitRepository {
    /// Open the working copy at `path`
    ///
    /// Bare repositories are rejected since tags have to be checked out
    /// somewhere for the scanner to read.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening git repository at: {}", path.display());

        if !path.exists() {
            error!("Path does not exist: {}", path.display());
            anyhow::bail!("Path does not exist: {}", path.display());
        }

        let repository = Repository::open(path)
            .with_context(|| format!("Failed to open repository at: {}", path.display()))?;

        let workdir = match repository.workdir() {
            Some(workdir) => workdir.to_path_buf(),
            None => anyhow::bail!("Repository at {} is bare; a working copy is required", path.display()),
        };

        let path = workdir.canonicalize()
            .with_context(|| format!("Failed to resolve canonical path for: {}", workdir.display()))?;

        debug!("Git repository opened: {}", path.display());
        Ok(Self { repository, path })
    }

    fn tag_commit(&self, tag: &str) -> Result<Commit<'_>> {
        let object = self.repository
            .revparse_single(&format!("refs/tags/{tag}"))
            .with_context(|| format!("Tag '{}' not found", tag))?;
        object.peel_to_commit()
            .with_context(|| format!("Tag '{}' does not point to a commit", tag))
    }
}

impl VersionControl for GitRepository {
    fn location(&self) -> &Path {
        &self.path
    }

    /// Tag names sorted by name, as `git tag -l` lists them
    fn list_tags(&self) -> Result<Vec<String>> {
        let names = self.repository
            .tag_names(None)
            .context("Failed to list tags")?;
        let mut tags: Vec<String> = names.iter().flatten().map(str::to_string).collect();
        tags.sort();
        debug!("Found {} tags in {}", tags.len(), self.path.display());
        Ok(tags)
    }

    /// Committer date in the committer's own timezone, and committer epoch seconds
    fn tag_commit_date_and_epoch(&self, tag: &str) -> Result<(NaiveDate, i64)> {
        let commit = self.tag_commit(tag)?;
        let time = commit.committer().when();
        let seconds = time.seconds();

        let offset = FixedOffset::east_opt(time.offset_minutes() * 60)
            .with_context(|| format!("Commit for tag '{}' has an invalid timezone offset", tag))?;
        let date = Utc.timestamp_opt(seconds, 0)
            .single()
            .with_context(|| format!("Commit for tag '{}' has an invalid timestamp {}", tag, seconds))?
            .with_timezone(&offset)
            .date_naive();

        Ok((date, seconds))
    }

    /// Detach HEAD at the tag's commit and update the working tree
    fn checkout(&self, tag: &str) -> Result<()> {
        let commit = self.tag_commit(tag)?;

        let mut options = CheckoutBuilder::new();
        options.safe();
        self.repository
            .checkout_tree(commit.as_object(), Some(&mut options))
            .with_context(|| format!("Failed to check out tree for tag '{}'", tag))?;
        self.repository
            .set_head_detached(commit.id())
            .with_context(|| format!("Failed to move HEAD to tag '{}'", tag))?;

        info!("HEAD detached at {} ({})", tag, commit.id());
        Ok(())
    }
}
