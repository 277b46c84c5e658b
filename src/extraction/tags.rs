//! Tag discovery
//!
//! Lists a repository's tags and stamps each with the date and epoch time of
//! the commit it points to.

use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::extraction::error::{ExtractionError, ExtractionResult};
use crate::extraction::traits::VersionControl;
use crate::parsing::validate_version_tag;

/// Date format used for release dates in every output
pub const RELEASE_DATE_FORMAT: &str = "%Y-%m-%d";

/// A release tag with the date of the commit it points to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionTag {
    pub name: String,
    pub release_date: NaiveDate,
    pub timestamp: i64,
}

impl VersionTag {
    pub fn new(name: impl Into<String>, release_date: NaiveDate, timestamp: i64) -> Self {
        Self {
            name: name.into(),
            release_date,
            timestamp,
        }
    }

    /// Release date as `YYYY-MM-DD`
    pub fn release_date_string(&self) -> String {
        self.release_date.format(RELEASE_DATE_FORMAT).to_string()
    }
}

/// Discovery options
#[derive(Debug, Clone, Default)]
pub struct TagDiscovery {
    /// Keep only the N most recent tags of the listing
    pub max_output: Option<usize>,
    /// Drop tags that are not `[v]X.Y.Z` releases before truncating
    pub release_tags_only: bool,
}

impl TagDiscovery {
    pub fn new(max_output: Option<usize>) -> Self {
        Self {
            max_output,
            release_tags_only: false,
        }
    }

    pub fn with_release_tags_only(mut self, enabled: bool) -> Self {
        self.release_tags_only = enabled;
        self
    }

    /// List tags with their release dates, in listing order
    pub fn discover(&self, vcs: &dyn VersionControl) -> ExtractionResult<Vec<VersionTag>> {
        let mut names = vcs.list_tags().map_err(|e| ExtractionError::RepositoryAccess {
            path: vcs.location().to_path_buf(),
            message: format!("{e:#}"),
        })?;
        debug!("Repository lists {} tags", names.len());

        if self.release_tags_only {
            names.retain(|name| validate_version_tag(name));
            debug!("{} tags remain after release-tag filtering", names.len());
        }

        let names = truncate_to_most_recent(names, self.max_output);

        let tags = names
            .into_iter()
            .map(|name| {
                let (release_date, timestamp) = vcs
                    .tag_commit_date_and_epoch(&name)
                    .map_err(|e| ExtractionError::TagMetadata {
                        tag: name.clone(),
                        message: format!("{e:#}"),
                    })?;
                debug!("Tag {} released {} ({})", name, release_date, timestamp);
                Ok(VersionTag::new(name, release_date, timestamp))
            })
            .collect::<ExtractionResult<Vec<_>>>()?;

        info!("Discovered {} tags in {}", tags.len(), vcs.location().display());
        Ok(tags)
    }
}

/// Keep the trailing `max_output` entries
fn truncate_to_most_recent(mut names: Vec<String>, max_output: Option<usize>) -> Vec<String> {
    match max_output {
        Some(max) if names.len() > max => names.split_off(names.len() - max),
        _ => names,
    }
}
