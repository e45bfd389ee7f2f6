use crate::generator::{GeneratorConfig, TemplateFile};
use crate::rule::Rule;
use crate::source::SourceKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default manifest file name, looked up in the working directory
pub const FILE_NAME: &str = "recast.toml";

/// A project manifest: the template files to generate and their rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Directory holding the templates, relative to the manifest
    #[serde(default = "default_template_root")]
    pub template_root: PathBuf,

    /// Where generated files go, relative to the manifest
    #[serde(default = "default_destination")]
    pub destination: PathBuf,

    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Abort a rule when one unit takes longer than this many milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    /// Directory of the template, relative to `template_root`
    #[serde(default = "default_dir")]
    pub path: PathBuf,

    pub name: String,

    /// Sub-directory of the destination the generated file goes to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,

    #[serde(default)]
    pub rules: Vec<RuleEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleEntry {
    pub name: String,

    /// Content source the rule runs against. A rule without one fails when applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceKind>,

    pub find: String,

    #[serde(default)]
    pub replace: String,

    #[serde(default)]
    pub regex: bool,

    /// Values below 1 replace every occurrence
    #[serde(default)]
    pub max_occurrences: i64,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            template_root: default_template_root(),
            destination: default_destination(),
            defaults: DefaultsConfig::default(),
            files: Vec::new(),
        }
    }
}

fn default_template_root() -> PathBuf {
    PathBuf::from("boilerplate")
}

fn default_destination() -> PathBuf {
    PathBuf::from("out")
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

impl RuleEntry {
    pub fn to_rule(&self) -> Rule {
        let rule = Rule::new(&self.name, &self.find, &self.replace)
            .regex(self.regex)
            .max_occurrences(self.max_occurrences);
        match self.source {
            Some(kind) => rule.with_source(kind.into_source()),
            None => rule,
        }
    }
}

impl Manifest {
    pub fn unit_timeout(&self) -> Option<Duration> {
        self.defaults.unit_timeout_ms.map(Duration::from_millis)
    }

    /// Load a manifest from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        let manifest: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse manifest {}", path.display()))?;
        Ok(manifest)
    }

    /// Save the manifest to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write manifest {}", path.display()))?;
        Ok(())
    }

    /// Build the generator, resolving relative roots against `base`
    /// (normally the directory holding the manifest).
    pub fn into_generator(self, base: &Path) -> GeneratorConfig {
        let template_root = base.join(&self.template_root);
        let files = self
            .files
            .into_iter()
            .map(|entry| {
                let file = TemplateFile::new(template_root.join(&entry.path), entry.name)
                    .with_rules(entry.rules.iter().map(RuleEntry::to_rule).collect());
                match entry.destination {
                    Some(dir) => file.with_relative_destination(dir),
                    None => file,
                }
            })
            .collect();

        GeneratorConfig {
            destination_root: base.join(&self.destination),
            files,
        }
    }
}
