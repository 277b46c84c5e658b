//! Scan driver: checkout followed by a static-analysis scan

use log::info;

use crate::extraction::error::{ExtractionError, ExtractionResult, ScanStage};
use crate::extraction::tags::VersionTag;
use crate::extraction::traits::{ScanRequest, ScanRunner, VersionControl};

/// Connection details passed to every scan
#[derive(Debug, Clone)]
pub struct ScanTarget {
    pub project_key: String,
    pub server_url: String,
    pub token: String,
}

/// Owns the working copy for the duration of one tag's checkout and scan
pub struct ScanDriver<'a> {
    vcs: &'a dyn VersionControl,
    runner: &'a dyn ScanRunner,
    target: &'a ScanTarget,
}

impl<'a> ScanDriver<'a> {
    pub fn new(vcs: &'a dyn VersionControl, runner: &'a dyn ScanRunner, target: &'a ScanTarget) -> Self {
        Self { vcs, runner, target }
    }

    /// Switch the working copy to the tag's revision
    pub fn checkout(&self, tag: &VersionTag) -> ExtractionResult<()> {
        self.vcs
            .checkout(&tag.name)
            .map_err(|e| ExtractionError::ScanExecution {
                tag: tag.name.clone(),
                stage: ScanStage::Checkout,
                message: format!("{e:#}"),
            })?;
        info!("Checked out tag {}", tag.name);
        Ok(())
    }

    /// Scan the working copy, reporting it under the tag's name as project version
    pub fn scan(&self, tag: &VersionTag) -> ExtractionResult<()> {
        let request = ScanRequest {
            base_dir: self.vcs.location(),
            project_key: &self.target.project_key,
            project_version: &tag.name,
            server_url: &self.target.server_url,
            token: &self.target.token,
        };
        self.runner
            .run_scan(&request)
            .map_err(|e| ExtractionError::ScanExecution {
                tag: tag.name.clone(),
                stage: ScanStage::Scan,
                message: format!("{e:#}"),
            })?;
        info!("Scan completed for tag {}", tag.name);
        Ok(())
    }
}
