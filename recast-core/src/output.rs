use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::Write;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Summary,
    Json,
}

/// Result of applying one rule to one file
#[derive(Debug, Serialize, Deserialize)]
pub struct ApplyResult {
    pub rule: String,
    pub path: String,
    pub source: String,
    pub units: usize,
    pub changed_units: usize,
    pub replacements: usize,
    pub written: bool,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

/// Units a content source found in a file
#[derive(Debug, Serialize, Deserialize)]
pub struct UnitsResult {
    pub path: String,
    pub source: String,
    pub units: Vec<String>,
}

/// Result of a generate operation
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResult {
    pub destination: String,
    pub files: Vec<FileResult>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileResult {
    pub template: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    pub rules_applied: usize,
    pub replacements: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerateResult {
    pub fn failures(&self) -> usize {
        self.files.iter().filter(|file| file.error.is_some()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failures() == 0
    }
}

/// Trait for formatting output in different formats
pub trait OutputFormatter {
    fn format(&self, format: OutputFormat) -> String;
    fn format_json(&self) -> String;
    fn format_summary(&self) -> String;
}

impl OutputFormatter for ApplyResult {
    fn format(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => self.format_json(),
            OutputFormat::Summary => self.format_summary(),
        }
    }

    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": true,
            "operation": "apply",
            "rule": self.rule,
            "path": self.path,
            "source": self.source,
            "dry_run": self.dry_run,
            "summary": {
                "units": self.units,
                "changed_units": self.changed_units,
                "replacements": self.replacements,
            },
            "written": self.written,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        let mut output = String::new();

        if let Some(diff) = &self.diff {
            output.push_str(diff);
        }

        writeln!(
            output,
            "Applied {} to {} ({} source)",
            self.rule, self.path, self.source
        )
        .unwrap();
        writeln!(
            output,
            "✓ {} replacements in {} of {} units",
            self.replacements, self.changed_units, self.units
        )
        .unwrap();

        if self.dry_run {
            output.push_str("Dry run: file left unchanged\n");
        } else if self.written {
            output.push_str("✓ File written\n");
        }

        output
    }
}

impl OutputFormatter for UnitsResult {
    fn format(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => self.format_json(),
            OutputFormat::Summary => self.format_summary(),
        }
    }

    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": true,
            "operation": "units",
            "path": self.path,
            "source": self.source,
            "units": self.units,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        let mut output = String::new();

        for (index, unit) in self.units.iter().enumerate() {
            writeln!(output, "{:>4}: {}", index + 1, unit).unwrap();
        }
        writeln!(
            output,
            "{} {} units in {}",
            self.units.len(),
            self.source,
            self.path
        )
        .unwrap();

        output
    }
}

impl OutputFormatter for GenerateResult {
    fn format(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => self.format_json(),
            OutputFormat::Summary => self.format_summary(),
        }
    }

    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": self.is_success(),
            "operation": "generate",
            "destination": self.destination,
            "summary": {
                "files": self.files.len(),
                "failed": self.failures(),
            },
            "files": self.files,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        let mut output = String::new();

        for file in &self.files {
            match (&file.destination, &file.error) {
                (_, Some(error)) => {
                    writeln!(output, "✗ {}: {}", file.template, error).unwrap();
                },
                (Some(destination), None) => {
                    writeln!(
                        output,
                        "✓ {} -> {} ({} rules, {} replacements)",
                        file.template, destination, file.rules_applied, file.replacements
                    )
                    .unwrap();
                },
                (None, None) => {},
            }
        }

        writeln!(
            output,
            "Generated {} of {} files into {}",
            self.files.len() - self.failures(),
            self.files.len(),
            self.destination
        )
        .unwrap();

        output
    }
}
