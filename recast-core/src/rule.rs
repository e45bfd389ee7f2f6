use crate::error::Result;
use crate::orchestrator;
use crate::source::ContentSource;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A find/replace directive bound to the content source it runs against.
///
/// Rules are plain values: they hold no per-file state and can be applied to
/// any number of files. A rule without a source is inert and fails with a
/// configuration error when applied.
#[derive(Debug, Clone, Default)]
pub struct Rule {
    /// Identifies the rule in errors and reports
    pub name: String,
    pub find: String,
    /// Inserted literally, also in regex mode
    pub replace: String,
    pub is_regex: bool,
    /// File-wide replacement budget; values below 1 mean unbounded
    pub max_occurrences: i64,
    pub source: Option<Arc<dyn ContentSource>>,
}

impl Rule {
    pub fn new(name: impl Into<String>, find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            find: find.into(),
            replace: replace.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn ContentSource>) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn regex(mut self, is_regex: bool) -> Self {
        self.is_regex = is_regex;
        self
    }

    #[must_use]
    pub fn max_occurrences(mut self, max: i64) -> Self {
        self.max_occurrences = max;
        self
    }

    /// The replacement budget, or `None` when unbounded.
    pub fn budget(&self) -> Option<usize> {
        usize::try_from(self.max_occurrences)
            .ok()
            .filter(|max| *max > 0)
    }

    /// Rewrite `path` in place according to this rule.
    pub fn apply(&self, path: &Path) -> Result<()> {
        orchestrator::apply(self, path)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
