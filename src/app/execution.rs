//! Application execution: tag listing and the extraction run

use anyhow::{Result, Context};
use log::{info, warn};
use crate::app::initialization::RunSettings;
use crate::extraction::{self, ExtractionRun, Extractor, VersionTag};
use crate::git::GitRepository;
use crate::output::{self, debt_summary};
use crate::sonar::{RetryingBackend, SonarClient, SonarScanner};

/// Discover and sample tags without touching the working copy
pub fn select_tags(settings: &RunSettings) -> Result<Vec<VersionTag>> {
    let repository = GitRepository::open(&settings.repository)?;
    extraction::select_tags(&repository, &settings.extraction)
        .context("Tag discovery failed")
}

/// Print the tags a run would process
pub fn list_tags(settings: &RunSettings) -> Result<()> {
    let tags = select_tags(settings)?;
    if tags.is_empty() {
        println!("No tags selected in {}", settings.repository.display());
    } else {
        println!("Selected {} tags in {}:", tags.len(), settings.repository.display());
        print!("{}", output::format_tag_table(&tags));
    }
    Ok(())
}

/// Scanner invocation with the configured extra properties
fn build_scanner(settings: &RunSettings) -> SonarScanner {
    SonarScanner::new(settings.scanner.clone())
        .with_properties(settings.scanner_properties.clone())
}

/// Checkout, scan and collect every selected tag, then export the results
///
/// Results are exported even when the run stops early; the returned error
/// then names the tag that failed.
pub fn run_extraction(settings: &RunSettings) -> Result<ExtractionRun> {
    let repository = GitRepository::open(&settings.repository)?;
    let scanner = build_scanner(settings);
    let mut client = SonarClient::new(
        settings.extraction.server_url.clone(),
        Some(settings.extraction.token.clone()),
        settings.timeout,
    )
    .with_project_scope(settings.extraction.project_key.clone());
    if let Some(page_size) = settings.issue_page_size {
        client = client.with_page_size(page_size);
    }
    let backend = RetryingBackend::new(client, settings.retry.clone());

    if settings.extraction.token.is_empty() {
        warn!("No SonarQube token configured; requests are sent anonymously");
    }

    info!(
        "Extracting {} from {} into {}",
        settings.extraction.project_key,
        settings.repository.display(),
        settings.output_dir.display()
    );

    let extractor = Extractor::new(&repository, &scanner, &backend, settings.extraction.clone());
    let run = extractor.run().context("Tag selection failed")?;

    let written = output::export_run(&run, &settings.output_dir)?;
    for path in &written {
        info!("Wrote {}", path.display());
    }

    print!("{}", output::format_run_summary(&run));
    let summary = debt_summary(&run.output.clean_code);
    print!("{}", output::format_control_limits(&summary));

    Ok(run)
}

/// Run the requested mode; a stopped extraction is an error
pub fn execute(settings: &RunSettings, list_only: bool) -> Result<()> {
    if list_only {
        return list_tags(settings);
    }

    let run = run_extraction(settings)?;
    match run.failure {
        None => Ok(()),
        Some(failure) => Err(anyhow::Error::new(failure.error).context(format!(
            "Extraction stopped at tag {} after {} of {} tags; partial results are in {}",
            failure.tag,
            run.output.processed.len(),
            run.selected.len(),
            settings.output_dir.display()
        ))),
    }
}
