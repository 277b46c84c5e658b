use clap::{Parser, ArgAction};
use anyhow::Result;
use std::path::PathBuf;
use log::{debug, info};

use crate::extraction::reserved_metric_keys;

/// Release-tag code quality trend extraction
#[derive(Parser, Debug, Clone)]
#[command(name = "tagtrend")]
#[command(about = "Samples a repository's release tags, runs a SonarQube scan at each one, and exports the metric and clean-code debt history")]
#[command(version)]
pub struct Args {
    /// Path to git repository (defaults to current directory if it's a git repository)
    #[arg(short = 'r', long = "repo", alias = "repository", value_name = "PATH")]
    pub repository: Option<String>,

    /// Verbose output (debug level logging)
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output (error level logging only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug output (trace level logging)
    #[arg(long)]
    pub debug: bool,

    /// Log format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log file path for file output
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level for file output (independent of console level)
    #[arg(long, value_name = "LEVEL")]
    pub log_file_level: Option<String>,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Configuration section name
    #[arg(long, value_name = "SECTION")]
    pub config_name: Option<String>,

    // ============ SONARQUBE ============

    /// SonarQube project key the scans are reported under
    #[arg(short = 'k', long = "project-key", value_name = "KEY")]
    pub project_key: Option<String>,

    /// SonarQube server URL (falls back to $SONARQUBE_SERVER_URL)
    #[arg(long = "sonar-url", value_name = "URL")]
    pub sonar_url: Option<String>,

    /// SonarQube token (falls back to $SONARQUBE_TOKEN)
    #[arg(long = "token", value_name = "TOKEN")]
    pub token: Option<String>,

    /// Scanner executable
    #[arg(long = "scanner", value_name = "PROGRAM")]
    pub scanner: Option<String>,

    /// Metric keys to collect - supports comma-separated values
    #[arg(short = 'm', long = "metrics", value_name = "KEY", action = ArgAction::Append, value_delimiter = ',')]
    pub metrics: Vec<String>,

    /// Extra scanner analysis property as KEY=VALUE (repeatable)
    #[arg(short = 'D', long = "property", value_name = "KEY=VALUE", action = ArgAction::Append)]
    pub properties: Vec<String>,

    /// HTTP timeout for SonarQube requests, in seconds
    #[arg(long = "timeout", value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    // ============ SAMPLING ============

    /// Keep only the N most recent tags of the listing
    #[arg(short = 'n', long = "max-tags", value_name = "N")]
    pub max_tags: Option<usize>,

    /// Keep at most N tags per calendar year
    #[arg(short = 'y', long = "max-per-year", value_name = "N")]
    pub max_tags_per_year: Option<usize>,

    /// Disable both tag limits
    #[arg(long = "all-tags")]
    pub all_tags: bool,

    /// Only consider tags of the form [v]X.Y.Z
    #[arg(long = "release-tags-only")]
    pub release_tags_only: bool,

    // ============ EXTRACTION ============

    /// Record metrics the server did not report as empty instead of failing
    #[arg(long = "pad-missing-metrics")]
    pub pad_missing_metrics: bool,

    /// Directory the CSV and JSON exports are written to
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print the selected tags and exit without scanning
    #[arg(long = "list-tags")]
    pub list_tags: bool,
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    debug!("Parsing command line arguments");
    let mut args = Args::parse();
    args.metrics = normalize_list(args.metrics);
    debug!("Parsed CLI arguments: {:?}", Args { token: args.token.as_ref().map(|_| "***".to_string()), ..args.clone() });
    args
}

/// Trim entries and drop empty ones
fn normalize_list(values: Vec<String>) -> Vec<String> {
    values.into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

/// Split a `KEY=VALUE` scanner property
pub fn parse_property(entry: &str) -> Result<(String, String)> {
    let (key, value) = entry.split_once('=').ok_or_else(|| {
        anyhow::anyhow!("Invalid scanner property '{}': expected KEY=VALUE", entry)
    })?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow::anyhow!("Invalid scanner property '{}': empty key", entry));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// The server is only reachable over plain HTTP(S)
pub fn validate_server_url(url: &str) -> Result<()> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(anyhow::anyhow!(
            "Invalid SonarQube URL '{}': expected an http:// or https:// address", url
        ));
    }
    Ok(())
}

/// Metric keys may not reuse the names of the metric export's index columns
pub fn validate_metric_keys(keys: &[String]) -> Result<()> {
    let reserved = reserved_metric_keys(keys);
    if !reserved.is_empty() {
        return Err(anyhow::anyhow!(
            "Metric keys {} clash with the version, release_date and timestamp columns",
            reserved.join(", ")
        ));
    }
    Ok(())
}

/// Validate CLI argument combinations
pub fn validate_args(args: &Args) -> Result<()> {
    debug!("Validating CLI argument combinations");

    let log_flags_count = [args.verbose, args.quiet, args.debug]
        .iter()
        .filter(|&&flag| flag)
        .count();

    if log_flags_count > 1 {
        return Err(anyhow::anyhow!(
            "Conflicting log level flags: only one of --verbose, --quiet, or --debug may be specified"
        ));
    }

    match args.log_format.to_lowercase().as_str() {
        "text" | "json" => {},
        _ => return Err(anyhow::anyhow!(
            "Invalid log format '{}'. Valid options: text, json", args.log_format
        )),
    }

    if let Some(ref level) = args.log_file_level {
        match level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {},
            _ => return Err(anyhow::anyhow!(
                "Invalid log file level '{}'. Valid levels: error, warn, info, debug, trace", level
            )),
        }
    }

    if args.log_file_level.is_some() && args.log_file.is_none() {
        return Err(anyhow::anyhow!(
            "--log-file-level requires --log-file to be specified"
        ));
    }

    if args.max_tags == Some(0) {
        return Err(anyhow::anyhow!("--max-tags must be at least 1"));
    }

    if args.max_tags_per_year == Some(0) {
        return Err(anyhow::anyhow!("--max-per-year must be at least 1"));
    }

    if args.all_tags && (args.max_tags.is_some() || args.max_tags_per_year.is_some()) {
        return Err(anyhow::anyhow!(
            "--all-tags cannot be combined with --max-tags or --max-per-year"
        ));
    }

    if args.timeout_secs == Some(0) {
        return Err(anyhow::anyhow!("--timeout must be at least 1 second"));
    }

    if let Some(url) = &args.sonar_url {
        validate_server_url(url)?;
    }

    validate_metric_keys(&args.metrics)?;

    for entry in &args.properties {
        parse_property(entry)?;
    }

    info!("CLI arguments validated successfully");
    Ok(())
}
