//! Application initialization and configuration

use anyhow::{Result, Context};
use std::path::{Path, PathBuf};
use std::time::Duration;
use log::{debug, error};
use crate::{cli, config, logging};
use crate::extraction::{default_metric_keys, ExtractionSettings, MissingMetricPolicy};
use crate::extraction::{DEFAULT_MAX_TAGS, DEFAULT_MAX_TAGS_PER_YEAR};
use crate::sonar::scanner::DEFAULT_SCANNER;
use crate::sonar::RetryPolicy;

/// Server used when neither CLI, config nor environment name one
pub const DEFAULT_SERVER_URL: &str = "http://localhost:9000";
pub const DEFAULT_OUTPUT_DIR: &str = "./tagtrend-output";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Everything a run needs, merged from CLI, config file and environment
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub repository: PathBuf,
    pub extraction: ExtractionSettings,
    pub scanner: String,
    /// Extra `-D` analysis properties handed to every scan
    pub scanner_properties: Vec<(String, String)>,
    pub output_dir: PathBuf,
    pub timeout: Duration,
    /// Issue search page size; the server maximum when unset
    pub issue_page_size: Option<u32>,
    pub retry: RetryPolicy,
}

pub fn load_configuration(args: &cli::Args) -> Result<config::ConfigManager> {
    let mut manager = if let Some(config_file) = &args.config_file {
        debug!("Loading configuration from explicit file: {}", config_file.display());
        config::ConfigManager::load_from_file(config_file.clone())?
    } else {
        config::ConfigManager::load()?
    };

    if let Some(section_name) = &args.config_name {
        debug!("Selecting configuration section: {}", section_name);
        manager.select_section(section_name.clone());
    }

    Ok(manager)
}

pub fn configure_logging(args: &cli::Args, config: &config::ConfigManager) -> Result<logging::LogConfig> {
    use log::LevelFilter;
    use std::str::FromStr;

    let console_level = if args.debug {
        LevelFilter::Trace
    } else if args.verbose {
        LevelFilter::Debug
    } else if args.quiet {
        LevelFilter::Error
    } else {
        match config.get_log_level("base", "console-level") {
            Ok(Some(level)) => {
                debug!("Using console log level from config: {:?}", level);
                level
            }
            Ok(None) => LevelFilter::Info,
            Err(e) => {
                debug!("Invalid console-level in config, using default: {}", e);
                LevelFilter::Info
            }
        }
    };

    let format = if !args.log_format.is_empty() && args.log_format != "text" {
        logging::LogFormat::from_str(&args.log_format)
            .map_err(|e| anyhow::anyhow!(e))?
    } else {
        match config.get_value("base", "log-format") {
            Some(format_str) => {
                debug!("Using log format from config: {}", format_str);
                logging::LogFormat::from_str(format_str)
                    .unwrap_or(logging::LogFormat::Text)
            }
            None => logging::LogFormat::Text,
        }
    };

    let log_file_path = args.log_file.clone()
        .or_else(|| config.get_path("base", "log-file"));

    let file_log_level = match &args.log_file_level {
        Some(level_str) => Some(logging::parse_log_level(level_str)?),
        None => {
            match config.get_log_level("base", "file-log-level") {
                Ok(level) => level,
                Err(e) => {
                    debug!("Invalid file-log-level in config, using None: {}", e);
                    None
                }
            }
        }
    };

    let (destination, file_level) = match (log_file_path, file_log_level) {
        (Some(file_path), Some(level)) => (logging::LogDestination::Both(file_path), Some(level)),
        (Some(file_path), None) => (logging::LogDestination::Both(file_path), Some(console_level)),
        (None, None) => (logging::LogDestination::Console, None),
        (None, Some(_)) => {
            error!("Log file level specified without log file - this should have been caught during validation");
            return Err(anyhow::anyhow!("Log file level specified without log file"));
        }
    };

    Ok(logging::LogConfig {
        console_level,
        file_level,
        format,
        destination,
    })
}

/// A sampling limit: CLI, then config (0 meaning unlimited), then default
fn resolve_limit(
    cli_value: Option<usize>,
    all_tags: bool,
    config: &config::ConfigManager,
    key: &str,
    default: usize,
) -> Result<Option<usize>> {
    if all_tags {
        return Ok(None);
    }
    if let Some(value) = cli_value {
        return Ok(Some(value));
    }
    match config.get_number::<usize>("sampling", key)? {
        Some(0) => Ok(None),
        Some(value) => Ok(Some(value)),
        None => Ok(Some(default)),
    }
}

/// First of CLI, config file, environment variable
fn resolve_credential(
    cli_value: Option<&String>,
    config: &config::ConfigManager,
    key: &str,
    env_name: &str,
) -> Option<String> {
    cli_value.cloned()
        .or_else(|| config.get_value("sonar", key).cloned())
        .or_else(|| config::env_value(env_name))
}

/// Project key defaults to the repository's directory name
fn default_project_key(repository: &Path) -> Result<String> {
    repository.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .filter(|name| !name.is_empty())
        .with_context(|| format!(
            "Cannot derive a project key from {}; pass --project-key",
            repository.display()
        ))
}

/// Merge CLI arguments over config file values, environment and defaults
pub fn resolve_run_settings(
    args: &cli::Args,
    config: &config::ConfigManager,
    repository: PathBuf,
) -> Result<RunSettings> {
    let project_key = match args.project_key.clone()
        .or_else(|| config.get_value("sonar", "project-key").cloned())
    {
        Some(key) => key,
        None => default_project_key(&repository)?,
    };

    let server_url = resolve_credential(args.sonar_url.as_ref(), config, "url", config::SERVER_URL_ENV)
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
    cli::validate_server_url(&server_url)?;
    let token = resolve_credential(args.token.as_ref(), config, "token", config::TOKEN_ENV)
        .unwrap_or_default();

    let metric_keys = if !args.metrics.is_empty() {
        args.metrics.clone()
    } else {
        config.get_list("sonar", "metrics")
            .filter(|keys| !keys.is_empty())
            .unwrap_or_else(default_metric_keys)
    };
    cli::validate_metric_keys(&metric_keys)?;

    let pad_missing = args.pad_missing_metrics
        || config.get_bool("extraction", "pad-missing-metrics")?.unwrap_or(false);
    let release_tags_only = args.release_tags_only
        || config.get_bool("extraction", "release-tags-only")?.unwrap_or(false);

    let mut extraction = ExtractionSettings::new(project_key, server_url);
    extraction.token = token;
    extraction.max_tags = resolve_limit(args.max_tags, args.all_tags, config, "max-tags", DEFAULT_MAX_TAGS)?;
    extraction.max_tags_per_year = resolve_limit(
        args.max_tags_per_year,
        args.all_tags,
        config,
        "max-tags-per-year",
        DEFAULT_MAX_TAGS_PER_YEAR,
    )?;
    extraction.metric_keys = metric_keys;
    extraction.missing_metrics = if pad_missing {
        MissingMetricPolicy::Pad
    } else {
        MissingMetricPolicy::Fail
    };
    extraction.release_tags_only = release_tags_only;

    let scanner = args.scanner.clone()
        .or_else(|| config.get_value("sonar", "scanner").cloned())
        .unwrap_or_else(|| DEFAULT_SCANNER.to_string());

    let property_entries = if !args.properties.is_empty() {
        args.properties.clone()
    } else {
        config.get_list("sonar", "properties").unwrap_or_default()
    };
    let scanner_properties = property_entries
        .iter()
        .map(|entry| cli::parse_property(entry))
        .collect::<Result<Vec<_>>>()?;

    let output_dir = args.output_dir.clone()
        .or_else(|| config.get_path("output", "directory"))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    let timeout_secs = match args.timeout_secs {
        Some(secs) => secs,
        None => config.get_number("sonar", "timeout-secs")?.unwrap_or(DEFAULT_TIMEOUT_SECS),
    };

    let issue_page_size = config.get_number::<u32>("sonar", "page-size")?;
    if issue_page_size == Some(0) {
        return Err(anyhow::anyhow!("[sonar] page-size must be at least 1"));
    }

    let retry = config.get_retry_policy()?;

    debug!(
        "Resolved settings: project {}, server {}, max tags {:?}, per year {:?}, {} metrics",
        extraction.project_key,
        extraction.server_url,
        extraction.max_tags,
        extraction.max_tags_per_year,
        extraction.metric_keys.len()
    );

    Ok(RunSettings {
        repository,
        extraction,
        scanner,
        scanner_properties,
        output_dir,
        timeout: Duration::from_secs(timeout_secs),
        issue_page_size,
        retry,
    })
}
