use crate::orchestrator::{read_units, ApplyOptions};
use crate::output::UnitsResult;
use crate::source::SourceKind;
use anyhow::{Context, Result};
use std::path::Path;

/// Units operation - lists what a content source streams for `path`
pub fn units_operation(path: &Path, kind: SourceKind, options: &ApplyOptions) -> Result<UnitsResult> {
    let source = kind.into_source();
    let units = read_units(source.as_ref(), path, options)
        .with_context(|| format!("Failed to read {} units from {}", kind, path.display()))?;

    Ok(UnitsResult {
        path: path.display().to_string(),
        source: kind.to_string(),
        units,
    })
}
