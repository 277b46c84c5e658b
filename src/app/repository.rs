//! Repository path resolution and validation

use anyhow::{Result, Context};
use std::path::PathBuf;
use log::{info, debug};

use crate::git::is_git_repository;

/// Expand a leading `~` to the home directory
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(rest);
        }
    } else if path == "~" {
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir;
        }
    }
    PathBuf::from(path)
}

/// Resolve repository path from CLI arguments
/// If no path provided, uses current directory and validates it's a git repository
pub fn resolve_repository_path(repository_arg: Option<&str>) -> Result<PathBuf> {
    match repository_arg {
        Some(path) => {
            debug!("Repository path provided: {}", path);
            let path_buf = expand_home(path);

            if !path_buf.exists() {
                anyhow::bail!(
                    "Directory does not exist: {}\n\nPlease check the path and try again. Make sure you have permission to access the directory.",
                    path_buf.display()
                );
            }

            if !is_git_repository(&path_buf) {
                anyhow::bail!(
                    "Not a valid git repository: {}\n\nMake sure this directory contains a git repository (initialized with 'git init' or cloned from a remote).",
                    path_buf.display()
                );
            }

            path_buf.canonicalize()
                .with_context(|| format!("Failed to resolve canonical path for: {}", path_buf.display()))
        }
        None => {
            debug!("No repository path provided, using current directory");
            let current_dir = std::env::current_dir()
                .context("Failed to get current directory")?;

            if !is_git_repository(&current_dir) {
                anyhow::bail!(
                    "Current directory '{}' is not a git repository.\n\nTo fix this:\n  • Navigate to a git repository directory\n  • Or specify a repository path: tagtrend --repo /path/to/repo",
                    current_dir.display()
                );
            }

            info!("Using current directory as git repository: {}", current_dir.display());
            Ok(current_dir)
        }
    }
}
