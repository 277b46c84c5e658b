//! sonar-scanner process invocation

use std::process::Command;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::extraction::traits::{ScanRequest, ScanRunner};

/// Default scanner executable
pub const DEFAULT_SCANNER: &str = "sonar-scanner";

/// Lines of scanner stderr kept in error messages
const ERROR_TAIL_LINES: usize = 20;

/// Runs the SonarScanner CLI as a child process
#[derive(Debug, Clone)]
pub struct SonarScanner {
    program: String,
    extra_properties: Vec<(String, String)>,
}

impl Default for SonarScanner {
    fn default() -> Self {
        Self::new(DEFAULT_SCANNER)
    }
}

impl SonarScanner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            extra_properties: Vec::new(),
        }
    }

    /// Additional `-D key=value` analysis properties
    pub fn with_properties(mut self, properties: Vec<(String, String)>) -> Self {
        self.extra_properties = properties;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Command-line arguments for one scan
    pub fn arguments(&self, request: &ScanRequest<'_>) -> Vec<String> {
        let mut properties = vec![
            format!("sonar.projectBaseDir={}", request.base_dir.display()),
            format!("sonar.projectVersion={}", request.project_version),
            format!("sonar.projectKey={}", request.project_key),
            "sonar.sources=.".to_string(),
            format!("sonar.host.url={}", request.server_url),
        ];
        if !request.token.is_empty() {
            properties.push(format!("sonar.login={}", request.token));
        }
        properties.extend(
            self.extra_properties
                .iter()
                .map(|(key, value)| format!("{key}={value}")),
        );

        properties
            .into_iter()
            .flat_map(|property| ["-D".to_string(), property])
            .collect()
    }
}

impl ScanRunner for SonarScanner {
    fn run_scan(&self, request: &ScanRequest<'_>) -> Result<()> {
        info!("Running {} for version {}", self.program, request.project_version);
        let output = Command::new(&self.program)
            .args(self.arguments(request))
            .current_dir(request.base_dir)
            .output()
            .with_context(|| format!("Failed to start '{}'", self.program))?;

        debug!(
            "{} finished with {} ({} bytes stdout)",
            self.program,
            output.status,
            output.stdout.len()
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = if stderr.trim().is_empty() { stdout } else { stderr };
            anyhow::bail!(
                "'{}' exited with {}:\n{}",
                self.program,
                output.status,
                tail(&detail, ERROR_TAIL_LINES)
            );
        }

        Ok(())
    }
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn request<'a>(token: &'a str) -> ScanRequest<'a> {
        ScanRequest {
            base_dir: Path::new("/work/repo"),
            project_key: "react",
            project_version: "v18.2.0",
            server_url: "http://localhost:9000",
            token,
        }
    }

    #[test]
    fn test_arguments_carry_version_and_project() {
        let scanner = SonarScanner::default();
        let args = scanner.arguments(&request("squ_token"));
        assert_eq!(
            args,
            vec![
                "-D", "sonar.projectBaseDir=/work/repo",
                "-D", "sonar.projectVersion=v18.2.0",
                "-D", "sonar.projectKey=react",
                "-D", "sonar.sources=.",
                "-D", "sonar.host.url=http://localhost:9000",
                "-D", "sonar.login=squ_token",
            ]
        );
    }

    #[test]
    fn test_empty_token_and_extra_properties() {
        let scanner = SonarScanner::new("/opt/scanner/bin/sonar-scanner")
            .with_properties(vec![("sonar.exclusions".to_string(), "**/test/**".to_string())]);
        let args = scanner.arguments(&request(""));
        assert!(!args.iter().any(|a| a.starts_with("sonar.login")));
        assert_eq!(args.last().unwrap(), "sonar.exclusions=**/test/**");
        assert_eq!(scanner.program(), "/opt/scanner/bin/sonar-scanner");
    }

    #[test]
    fn test_missing_program_fails() {
        let temp = tempfile::TempDir::new().unwrap();
        let scanner = SonarScanner::new("tagtrend-no-such-scanner");
        let request = ScanRequest {
            base_dir: temp.path(),
            ..request("")
        };
        let err = scanner.run_scan(&request).unwrap_err();
        assert!(err.to_string().contains("Failed to start"));
    }

    #[test]
    fn test_tail_keeps_last_lines() {
        assert_eq!(tail("a\nb\nc\nd", 2), "c\nd");
        assert_eq!(tail("a", 5), "a");
    }
}
