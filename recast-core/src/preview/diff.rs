use nu_ansi_term::{Color as AnsiColor, Style};
use similar::{ChangeTag, TextDiff};
use std::fmt::Write;
use std::path::Path;

const CONTEXT_LINES: usize = 2;

fn line_style(tag: ChangeTag) -> Style {
    match tag {
        // Deleted line background: #852134
        ChangeTag::Delete => Style::new()
            .on(AnsiColor::Rgb(0x85, 0x21, 0x34))
            .fg(AnsiColor::Rgb(0xFF, 0xFF, 0xFF)),
        // Added line background: #005e24
        ChangeTag::Insert => Style::new()
            .on(AnsiColor::Rgb(0x00, 0x5E, 0x24))
            .fg(AnsiColor::Rgb(0xFF, 0xFF, 0xFF)),
        ChangeTag::Equal => Style::new(),
    }
}

fn display_path(path: &Path) -> String {
    // Make path relative to current directory for cleaner display
    let relative_path = match std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok())
    {
        Some(rel) => rel,
        None => path,
    };

    // Use forward slashes for consistent cross-platform output
    if cfg!(windows) {
        relative_path.to_string_lossy().replace('\\', "/")
    } else {
        relative_path.to_string_lossy().to_string()
    }
}

/// Render the change from `before` to `after` as a unified diff of `path`.
///
/// Returns an empty string when the two texts are identical.
pub fn render_diff(path: &Path, before: &str, after: &str, use_color: bool) -> String {
    let mut output = String::new();
    let diff = TextDiff::from_lines(before, after);
    let groups = diff.grouped_ops(CONTEXT_LINES);
    if groups.is_empty() {
        return output;
    }

    let file_str = display_path(path);
    if use_color {
        write!(
            output,
            "{}",
            Style::new()
                .fg(AnsiColor::White)
                .bold()
                .paint(format!("--- {}\n+++ {}\n", file_str, file_str))
        )
        .unwrap();
    } else {
        write!(output, "--- {}\n+++ {}\n", file_str, file_str).unwrap();
    }

    for group in groups {
        let first_line = group
            .first()
            .map_or(0, |op| op.old_range().start)
            + 1;
        if use_color {
            write!(
                output,
                "{}",
                AnsiColor::Blue.paint(format!("@@ line {} @@\n", first_line))
            )
            .unwrap();
        } else {
            writeln!(output, "@@ line {} @@", first_line).unwrap();
        }

        for op in &group {
            for change in diff.iter_changes(op) {
                let tag = change.tag();
                let sign = match tag {
                    ChangeTag::Delete => "-",
                    ChangeTag::Insert => "+",
                    ChangeTag::Equal => " ",
                };

                let change_text = change.to_string();
                let change_text = change_text.trim_end_matches(['\n', '\r']);

                if use_color && tag != ChangeTag::Equal {
                    let sign_color = if tag == ChangeTag::Delete {
                        AnsiColor::Red
                    } else {
                        AnsiColor::Green
                    };
                    writeln!(
                        output,
                        "{}{}",
                        sign_color.paint(sign),
                        line_style(tag).paint(change_text)
                    )
                    .unwrap();
                } else {
                    writeln!(output, "{}{}", sign, change_text).unwrap();
                }
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_texts_render_nothing() {
        let text = "package main\n";
        assert_eq!(render_diff(Path::new("main.go"), text, text, false), "");
    }

    #[test]
    fn test_plain_diff() {
        let before = "// {{.Name}} server\npackage main\n\nfunc main() {}\n";
        let after = "// acme server\npackage main\n\nfunc main() {}\n";

        let rendered = render_diff(Path::new("cmd/main.go"), before, after, false);

        assert_eq!(
            rendered,
            "--- cmd/main.go\n+++ cmd/main.go\n@@ line 1 @@\n-// {{.Name}} server\n+// acme server\n package main\n \n"
        );
    }

    #[test]
    fn test_hunk_header_uses_first_line_of_group() {
        let before = "a\nb\nc\nd\ne\nf\ng\n";
        let after = "a\nb\nc\nd\ne\nF\ng\n";

        let rendered = render_diff(Path::new("letters.txt"), before, after, false);

        assert!(rendered.contains("@@ line 4 @@\n d\n e\n-f\n+F\n g\n"));
    }

    #[test]
    fn test_colored_diff_paints_changed_lines() {
        let rendered = render_diff(Path::new("README.md"), "old\n", "new\n", true);

        assert!(rendered.contains("\u{1b}[31m-\u{1b}[0m"));
        assert!(rendered.contains("\u{1b}[32m+\u{1b}[0m"));
        assert!(rendered.contains("\u{1b}[48;2;133;33;52;38;2;255;255;255mold\u{1b}[0m"));
        assert!(rendered.contains("\u{1b}[48;2;0;94;36;38;2;255;255;255mnew\u{1b}[0m"));
    }
}
