// Logging module for tagtrend
// Structured logging with timestamp formatting and text or JSON output
//
// Supports:
// - Text and JSON line formats
// - Console (stderr) output, optionally mirrored to a log file
// - Independent log levels for console and file output
// - Timestamps formatted as YYYY-MM-DD HH:mm:ss
//
// Records from dependencies (ureq, rustls) are dropped below trace so that
// `--verbose` shows the pipeline's own debug output only.
//
// Example usage:
// ```
// let config = LogConfig {
//     console_level: LevelFilter::Info,
//     file_level: Some(LevelFilter::Debug),
//     format: LogFormat::Json,
//     destination: LogDestination::Both(PathBuf::from("tagtrend.log")),
// };
// init_logger(config)?;
// log::info!("Extraction started");
// ```

use log::{Level, LevelFilter, Metadata};
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use anyhow::{Context, Result};

/// Module path prefix of this crate's records
const CRATE_TARGET: &str = "tagtrend";

/// Log output format options
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}. Valid options: text, json", s)),
        }
    }
}

/// Log destination options
#[derive(Debug, Clone, PartialEq)]
pub enum LogDestination {
    Console,
    Both(PathBuf),
}

/// JSON log entry structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonLogEntry {
    pub timestamp: String,
    pub level: String,
    pub target: String,
    pub message: String,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub console_level: LevelFilter,
    pub file_level: Option<LevelFilter>,
    pub format: LogFormat,
    pub destination: LogDestination,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_level: LevelFilter::Info,
            file_level: None,
            format: LogFormat::Text,
            destination: LogDestination::Console,
        }
    }
}

/// Custom logger implementation
pub struct TagtrendLogger {
    config: LogConfig,
    file: Option<Mutex<File>>,
}

impl TagtrendLogger {
    /// Create a logger, opening the log file up front when one is configured
    pub fn new(config: LogConfig) -> Result<Self> {
        let file = match &config.destination {
            LogDestination::Console => None,
            LogDestination::Both(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("Failed to open log file: {}", path.display()))?;
                Some(Mutex::new(file))
            }
        };
        Ok(Self { config, file })
    }

    fn format_timestamp() -> String {
        let now: DateTime<Local> = Local::now();
        now.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    fn format_text_message(&self, level: Level, message: &str) -> String {
        let timestamp = Self::format_timestamp();
        format!("{} [{}] {}", timestamp, level.to_string().to_uppercase(), message)
    }

    fn format_json_message(&self, level: Level, target: &str, message: &str) -> Result<String> {
        let entry = JsonLogEntry {
            timestamp: Self::format_timestamp(),
            level: level.to_string().to_uppercase(),
            target: target.to_string(),
            message: message.to_string(),
        };

        serde_json::to_string(&entry)
            .context("Failed to serialize log entry to JSON")
    }

    fn should_log_to_console(&self, level: Level) -> bool {
        level <= self.config.console_level
    }

    fn should_log_to_file(&self, level: Level) -> bool {
        match self.config.file_level {
            Some(file_level) => self.file.is_some() && level <= file_level,
            None => false,
        }
    }

    fn is_own_or_trace(metadata: &Metadata) -> bool {
        metadata.target().starts_with(CRATE_TARGET)
            || metadata.level() <= Level::Info
            || metadata.level() == Level::Trace
    }

    fn write_to_console(&self, formatted_message: &str) -> Result<()> {
        writeln!(io::stderr(), "{}", formatted_message)
            .context("Failed to write to console")
    }

    fn write_to_file(&self, formatted_message: &str) -> Result<()> {
        let Some(file) = &self.file else {
            return Ok(());
        };
        let mut file = file.lock()
            .map_err(|_| anyhow::anyhow!("Log file lock poisoned"))?;
        writeln!(file, "{}", formatted_message)
            .context("Failed to write to log file")
    }
}

impl log::Log for TagtrendLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        Self::is_own_or_trace(metadata)
            && (self.should_log_to_console(metadata.level()) || self.should_log_to_file(metadata.level()))
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let message = record.args().to_string();
        let level = record.level();

        let formatted_message = match self.config.format {
            LogFormat::Text => self.format_text_message(level, &message),
            LogFormat::Json => {
                match self.format_json_message(level, record.target(), &message) {
                    Ok(json) => json,
                    Err(e) => {
                        eprintln!("JSON formatting error: {}. Falling back to text format.", e);
                        self.format_text_message(level, &message)
                    }
                }
            }
        };

        if self.should_log_to_console(level) {
            if let Err(e) = self.write_to_console(&formatted_message) {
                eprintln!("Console logging error: {}", e);
            }
        }
        if self.should_log_to_file(level) {
            if let Err(e) = self.write_to_file(&formatted_message) {
                eprintln!("File logging error: {}", e);
            }
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = file.flush();
            }
        }
    }
}

/// Initialize the logging system with the given configuration
pub fn init_logger(config: LogConfig) -> Result<()> {
    let max_level = match config.file_level {
        Some(file_level) => file_level.max(config.console_level),
        None => config.console_level,
    };
    let logger = TagtrendLogger::new(config)?;

    log::set_boxed_logger(Box::new(logger))
        .context("Failed to set global logger")?;

    log::set_max_level(max_level);

    Ok(())
}

/// Convert string to LevelFilter
pub fn parse_log_level(level_str: &str) -> Result<LevelFilter> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(LevelFilter::Error),
        "warn" => Ok(LevelFilter::Warn),
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        "trace" => Ok(LevelFilter::Trace),
        "off" => Ok(LevelFilter::Off),
        _ => Err(anyhow::anyhow!("Invalid log level: {}. Valid levels: error, warn, info, debug, trace, off", level_str)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Log;
    use tempfile::TempDir;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_log_level("error").unwrap(), LevelFilter::Error);
        assert_eq!(parse_log_level("warn").unwrap(), LevelFilter::Warn);
        assert_eq!(parse_log_level("DEBUG").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_log_level("off").unwrap(), LevelFilter::Off);
        assert!(parse_log_level("verbose").is_err());
    }

    #[test]
    fn test_timestamp_format() {
        let timestamp = TagtrendLogger::format_timestamp();
        assert_eq!(timestamp.len(), 19);
        assert_eq!(timestamp.chars().nth(4), Some('-'));
        assert_eq!(timestamp.chars().nth(10), Some(' '));
        assert_eq!(timestamp.chars().nth(16), Some(':'));
    }

    #[test]
    fn test_json_message_carries_target() {
        let logger = TagtrendLogger::new(LogConfig::default()).unwrap();
        let formatted = logger
            .format_json_message(Level::Info, "tagtrend::extraction::scan", "Scan completed for tag v1.0.0")
            .unwrap();
        let entry: JsonLogEntry = serde_json::from_str(&formatted).unwrap();
        assert_eq!(entry.level, "INFO");
        assert_eq!(entry.target, "tagtrend::extraction::scan");
        assert_eq!(entry.message, "Scan completed for tag v1.0.0");
    }

    #[test]
    fn test_text_message_formatting() {
        let logger = TagtrendLogger::new(LogConfig::default()).unwrap();
        let formatted = logger.format_text_message(Level::Warn, "Tag skipped");
        assert!(formatted.ends_with("[WARN] Tag skipped"));
    }

    #[test]
    fn test_dependency_debug_records_are_filtered() {
        let config = LogConfig {
            console_level: LevelFilter::Debug,
            ..LogConfig::default()
        };
        let logger = TagtrendLogger::new(config).unwrap();

        let own = Metadata::builder().level(Level::Debug).target("tagtrend::git").build();
        let foreign = Metadata::builder().level(Level::Debug).target("ureq::unit").build();
        let foreign_warn = Metadata::builder().level(Level::Warn).target("ureq::unit").build();
        assert!(logger.enabled(&own));
        assert!(!logger.enabled(&foreign));
        assert!(logger.enabled(&foreign_warn));
    }

    #[test]
    fn test_file_destination_is_written() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tagtrend.log");
        let config = LogConfig {
            console_level: LevelFilter::Off,
            file_level: Some(LevelFilter::Info),
            format: LogFormat::Text,
            destination: LogDestination::Both(path.clone()),
        };
        let logger = TagtrendLogger::new(config).unwrap();

        logger.log(
            &log::Record::builder()
                .args(format_args!("Discovered 3 tags"))
                .level(Level::Info)
                .target("tagtrend::extraction::tags")
                .build(),
        );
        logger.flush();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("[INFO] Discovered 3 tags"));
    }

    #[test]
    fn test_unwritable_log_file_is_an_error() {
        let config = LogConfig {
            destination: LogDestination::Both(PathBuf::from("/definitely/not/here/tagtrend.log")),
            ..LogConfig::default()
        };
        assert!(TagtrendLogger::new(config).is_err());
    }
}
