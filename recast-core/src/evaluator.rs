use crate::error::{RefactorError, Result};
use crate::rule::Rule;
use regex::{NoExpand, Regex};

#[derive(Debug, Clone)]
enum Finder {
    Literal(String),
    Pattern(Regex),
}

/// Computes replacement units for one pass of a rule over one file.
///
/// The occurrence cap is a budget shared by every unit of the file: once the
/// budget is spent, later units pass through untouched. A fresh evaluator is
/// compiled for each file.
#[derive(Debug, Clone)]
pub struct Evaluator {
    finder: Finder,
    replace: String,
    remaining: Option<usize>,
    replacements: usize,
}

impl Evaluator {
    /// Compile `rule`. An invalid regex is a configuration error.
    pub fn compile(rule: &Rule) -> Result<Self> {
        let finder = if rule.is_regex {
            let regex = Regex::new(&rule.find).map_err(|source| RefactorError::InvalidRegex {
                rule: rule.name.clone(),
                source,
            })?;
            Finder::Pattern(regex)
        } else {
            Finder::Literal(rule.find.clone())
        };

        Ok(Self {
            finder,
            replace: rule.replace.clone(),
            remaining: rule.budget(),
            replacements: 0,
        })
    }

    /// Replacement for `unit`. Units without a match come back unchanged and
    /// cost nothing from the budget.
    pub fn transform(&mut self, unit: &str) -> String {
        let limit = self.remaining.unwrap_or(usize::MAX);
        if limit == 0 {
            return unit.to_string();
        }

        let (output, count) = match &self.finder {
            // Literal mode spends the same file-wide budget as regex mode
            Finder::Literal(find) => {
                let count = unit.matches(find.as_str()).take(limit).count();
                if count == 0 {
                    return unit.to_string();
                }
                (unit.replacen(find.as_str(), &self.replace, count), count)
            },
            Finder::Pattern(regex) => {
                let count = regex.find_iter(unit).take(limit).count();
                if count == 0 {
                    return unit.to_string();
                }
                // replacen treats a limit of 0 as "all", guarded above
                let output = regex.replacen(unit, count, NoExpand(&self.replace));
                (output.into_owned(), count)
            },
        };

        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= count;
        }
        self.replacements += count;
        output
    }

    /// Number of occurrences replaced so far.
    pub fn replacements(&self) -> usize {
        self.replacements
    }

    /// Budget left, or `None` when unbounded.
    pub fn remaining(&self) -> Option<usize> {
        self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(find: &str, replace: &str, max: i64) -> Evaluator {
        Evaluator::compile(&Rule::new("literal", find, replace).max_occurrences(max)).unwrap()
    }

    fn pattern(find: &str, replace: &str, max: i64) -> Evaluator {
        Evaluator::compile(
            &Rule::new("regex", find, replace)
                .regex(true)
                .max_occurrences(max),
        )
        .unwrap()
    }

    #[test]
    fn test_literal_replaces_all_when_unbounded() {
        let mut eval = literal("{{.Name}}", "acme", 0);
        assert_eq!(eval.transform("{{.Name}} and {{.Name}}"), "acme and acme");
        assert_eq!(eval.replacements(), 2);
        assert_eq!(eval.remaining(), None);
    }

    #[test]
    fn test_literal_cap_is_leftmost_first() {
        let mut eval = literal("x", "y", 2);
        assert_eq!(eval.transform("x x x"), "y y x");
        assert_eq!(eval.remaining(), Some(0));
    }

    #[test]
    fn test_cap_spans_units() {
        let mut eval = pattern("a+", "b", 3);
        let units = ["a a", "a a", "a a"];
        let out: Vec<_> = units.iter().map(|u| eval.transform(u)).collect();
        assert_eq!(out, vec!["b b", "b a", "a a"]);
        assert_eq!(eval.replacements(), 3);
    }

    #[test]
    fn test_unit_without_match_costs_nothing() {
        let mut eval = pattern("needle", "pin", 1);
        assert_eq!(eval.transform("haystack"), "haystack");
        assert_eq!(eval.remaining(), Some(1));
        assert_eq!(eval.transform("a needle, a needle"), "a pin, a needle");
        assert_eq!(eval.remaining(), Some(0));
    }

    #[test]
    fn test_exhausted_budget_passes_units_through() {
        let mut eval = literal("a", "b", 1);
        assert_eq!(eval.transform("a"), "b");
        assert_eq!(eval.transform("aaaa"), "aaaa");
        assert_eq!(eval.replacements(), 1);
    }

    #[test]
    fn test_regex_replacement_is_literal() {
        let mut eval = pattern(r"web-starter/(\w+)", "$1-server", 0);
        assert_eq!(
            eval.transform("\"github.com/cuttle-ai/web-starter/boilerplate\""),
            "\"github.com/cuttle-ai/$1-server\""
        );
    }

    #[test]
    fn test_literal_find_is_not_a_pattern() {
        let mut eval = literal("a.c", "x", 0);
        assert_eq!(eval.transform("abc a.c"), "abc x");
    }

    #[test]
    fn test_invalid_regex_is_configuration_error() {
        let err = Evaluator::compile(&Rule::new("broken", "(unclosed", "x").regex(true)).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("broken"));
    }
}
