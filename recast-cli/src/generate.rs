use anyhow::{anyhow, Result};
use recast_core::{generate_operation, ApplyOptions, OutputFormatter};
use std::path::{Path, PathBuf};

use crate::OutputFormat;

pub fn handle_generate(
    manifest: &Path,
    destination: Option<PathBuf>,
    options: &ApplyOptions,
    output: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let result = generate_operation(manifest, destination, options)?;

    match output {
        OutputFormat::Json => {
            print!("{}", result.format_json());
        },
        OutputFormat::Summary => {
            if !quiet {
                print!("{}", result.format_summary());
            }
        },
    }

    if result.is_success() {
        Ok(())
    } else {
        Err(anyhow!(
            "{} of {} template files failed to generate",
            result.failures(),
            result.files.len()
        ))
    }
}
