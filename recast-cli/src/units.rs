use anyhow::Result;
use recast_core::{units_operation, ApplyOptions, OutputFormatter, SourceKind};
use std::path::Path;

use crate::OutputFormat;

pub fn handle_units(
    file: &Path,
    source: SourceKind,
    options: &ApplyOptions,
    output: OutputFormat,
) -> Result<()> {
    let result = units_operation(file, source, options)?;
    print!("{}", result.format(output.into()));
    Ok(())
}
