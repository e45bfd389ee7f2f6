use crate::config::Manifest;
use crate::error::RefactorError;
use crate::generator::FileOutcome;
use crate::orchestrator::ApplyOptions;
use crate::output::{FileResult, GenerateResult};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

/// Generate operation - equivalent to `recast generate`
///
/// Relative paths in the manifest resolve against the manifest's directory.
/// `destination` overrides the manifest's destination. A timeout set in
/// `options` wins over the manifest default. A cancelled run fails with
/// [`RefactorError::Cancelled`] instead of reporting per-file failures.
pub fn generate_operation(
    manifest_path: &Path,
    destination: Option<PathBuf>,
    options: &ApplyOptions,
) -> Result<GenerateResult> {
    let manifest = Manifest::load_from_path(manifest_path)?;
    let base = manifest_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let options = ApplyOptions {
        unit_timeout: options.unit_timeout.or_else(|| manifest.unit_timeout()),
        ..options.clone()
    };

    let mut generator = manifest.into_generator(base);
    if let Some(destination) = destination {
        generator.destination_root = destination;
    }

    info!(
        files = generator.files.len(),
        destination = %generator.destination_root.display(),
        "generating project"
    );
    let files = generator
        .generate_all(&options)
        .into_iter()
        .map(file_result)
        .collect();

    if options.cancel.is_cancelled() {
        return Err(RefactorError::Cancelled.into());
    }

    Ok(GenerateResult {
        destination: generator.destination_root.display().to_string(),
        files,
    })
}

fn file_result(outcome: FileOutcome) -> FileResult {
    let template = outcome.template.display().to_string();
    match outcome.result {
        Ok(generated) => FileResult {
            template,
            destination: Some(generated.destination.display().to_string()),
            rules_applied: generated.applied.len(),
            replacements: generated.applied.iter().map(|report| report.replacements).sum(),
            error: None,
        },
        Err(err) => FileResult {
            template,
            destination: None,
            rules_applied: 0,
            replacements: 0,
            error: Some(err.to_string()),
        },
    }
}
