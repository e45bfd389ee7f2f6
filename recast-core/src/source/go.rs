use super::handshake::{Handshake, HandshakeOptions, UnitProducer};
use super::ContentSource;
use crate::error::{RefactorError, Result};
use std::fs;
use std::io;
use std::ops::Range;
use std::path::Path;
use tracing::debug;
use tree_sitter::{Node, Parser, Tree};

/// Streams every comment of a Go source file, `//` and `/* */` alike.
///
/// Units are the full comment text including delimiters, in document order.
/// Only the comment bytes change on write-back; the rest of the file is kept
/// byte for byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommentSource;

impl CommentSource {
    pub fn new() -> Self {
        Self
    }
}

impl ContentSource for CommentSource {
    fn kind(&self) -> &'static str {
        "comment"
    }

    fn initiate(&self, path: &Path, options: &HandshakeOptions) -> Result<Handshake> {
        let document = GoDocument::parse(path)?;
        let ranges = document.collect(|node| (node.kind() == "comment").then_some(node));
        debug!(path = %path.display(), comments = ranges.len(), "parsed go comments");
        Ok(Handshake::spawn(
            path,
            SpliceProducer::new(document.text, ranges),
            options,
        ))
    }
}

/// Streams the path literal of every import spec in a Go source file.
///
/// Units are the literal as written, quotes included (`"fmt"`), so a
/// replacement must carry its own quotes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportPathSource;

impl ImportPathSource {
    pub fn new() -> Self {
        Self
    }
}

impl ContentSource for ImportPathSource {
    fn kind(&self) -> &'static str {
        "import"
    }

    fn initiate(&self, path: &Path, options: &HandshakeOptions) -> Result<Handshake> {
        let document = GoDocument::parse(path)?;
        let ranges = document.collect(|node| {
            if node.kind() == "import_spec" {
                node.child_by_field_name("path")
            } else {
                None
            }
        });
        debug!(path = %path.display(), imports = ranges.len(), "parsed go imports");
        Ok(Handshake::spawn(
            path,
            SpliceProducer::new(document.text, ranges),
            options,
        ))
    }
}

/// A parsed Go file: the original text plus its syntax tree.
struct GoDocument {
    text: String,
    tree: Tree,
}

impl GoDocument {
    fn parse(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            if e.kind() == io::ErrorKind::InvalidData {
                RefactorError::Parse {
                    path: path.to_path_buf(),
                    message: "source is not valid UTF-8".to_string(),
                }
            } else {
                RefactorError::read(path, e)
            }
        })?;

        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|_| RefactorError::Parse {
                path: path.to_path_buf(),
                message: "the Go grammar is incompatible with this tree-sitter version"
                    .to_string(),
            })?;

        let tree = parser
            .parse(&text, None)
            .ok_or_else(|| RefactorError::Parse {
                path: path.to_path_buf(),
                message: "parser produced no syntax tree".to_string(),
            })?;

        let root = tree.root_node();
        if root.has_error() {
            let position = first_error(root).map_or(root.start_position(), |n| n.start_position());
            return Err(RefactorError::Parse {
                path: path.to_path_buf(),
                message: format!(
                    "syntax error at line {}, column {}",
                    position.row + 1,
                    position.column + 1
                ),
            });
        }

        Ok(Self { text, tree })
    }

    /// Byte ranges of the nodes selected by `pick`, in document order.
    fn collect<'t, F>(&'t self, mut pick: F) -> Vec<Range<usize>>
    where
        F: FnMut(Node<'t>) -> Option<Node<'t>>,
    {
        let mut ranges = Vec::new();
        let mut cursor = self.tree.walk();

        loop {
            if let Some(node) = pick(cursor.node()) {
                ranges.push(node.byte_range());
            }
            if cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return ranges;
                }
            }
        }
    }
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(Node::has_error)
        .find_map(first_error)
}

/// Hands out fixed byte ranges of a text and splices replacements back in.
struct SpliceProducer {
    text: String,
    ranges: Vec<Range<usize>>,
    replacements: Vec<String>,
}

impl SpliceProducer {
    fn new(text: String, ranges: Vec<Range<usize>>) -> Self {
        Self {
            text,
            replacements: Vec::with_capacity(ranges.len()),
            ranges,
        }
    }
}

impl UnitProducer for SpliceProducer {
    fn next_unit(&mut self) -> Result<Option<String>> {
        Ok(self
            .ranges
            .get(self.replacements.len())
            .map(|range| self.text[range.clone()].to_string()))
    }

    fn accept(&mut self, replacement: String) -> Result<()> {
        self.replacements.push(replacement);
        Ok(())
    }

    fn finish(self) -> Result<String> {
        let mut output = String::with_capacity(self.text.len());
        let mut last_end = 0;

        for (range, replacement) in self.ranges.iter().zip(&self.replacements) {
            output.push_str(&self.text[last_end..range.start]);
            output.push_str(replacement);
            last_end = range.end;
        }
        output.push_str(&self.text[last_end..]);

        Ok(output)
    }
}
