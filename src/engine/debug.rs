//! Match-tree inspection
//!
//! - [`TreePrinter`]: indented text rendering of a match tree
//! - [`match_to_json`]: the same tree as a JSON value

use std::fmt::Write;

use serde_json::{json, Value};

use super::grammar::Grammar;
use super::matches::Match;

/// Match tree pretty printer
///
/// Each line shows the parser (rule name or label), the byte range and the
/// matched text:
///
/// ```text
/// sum [0..3) "1+2"
///   digit [0..1) "1"
///   '+' [1..2) "+"
///   digit [2..3) "2"
/// ```
pub struct TreePrinter {
    indent: String,
    max_depth: Option<usize>,
    max_text: usize,
}

impl Default for TreePrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl TreePrinter {
    /// Create a printer with two-space indentation and no depth limit
    pub fn new() -> Self {
        Self {
            indent: "  ".to_string(),
            max_depth: None,
            max_text: 40,
        }
    }

    /// Set the indentation string
    pub fn indent(mut self, indent: &str) -> Self {
        self.indent = indent.to_string();
        self
    }

    /// Stop descending below `depth`
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Truncate matched text longer than `chars`
    pub fn max_text(mut self, chars: usize) -> Self {
        self.max_text = chars;
        self
    }

    /// Render `root`
    pub fn print(&self, root: &Match, grammar: &Grammar, document: &str) -> String {
        let mut output = String::new();
        self.print_node(root, grammar, document, 0, &mut output);
        output
    }

    fn print_node(
        &self,
        node: &Match,
        grammar: &Grammar,
        document: &str,
        depth: usize,
        output: &mut String,
    ) {
        let indent = self.indent.repeat(depth);

        if self.max_depth.map_or(false, |max| depth > max) {
            let _ = writeln!(output, "{}...", indent);
            return;
        }

        let _ = writeln!(
            output,
            "{}{} [{}..{}) {:?}",
            indent,
            grammar.describe(node.parser()),
            node.start(),
            node.end(),
            self.clip(node.text(document))
        );

        for child in node.children() {
            self.print_node(child, grammar, document, depth + 1, output);
        }
    }

    fn clip(&self, text: &str) -> String {
        if text.chars().count() <= self.max_text {
            return text.to_string();
        }
        let mut clipped: String = text.chars().take(self.max_text).collect();
        clipped.push_str("...");
        clipped
    }
}

/// A match tree as JSON
///
/// ```json
/// {"parser": "sum", "start": 0, "end": 3, "text": "1+2", "children": [...]}
/// ```
pub fn match_to_json(root: &Match, grammar: &Grammar, document: &str) -> Value {
    let children: Vec<Value> = root
        .children()
        .iter()
        .map(|c| match_to_json(c, grammar, document))
        .collect();

    json!({
        "parser": grammar.describe(root.parser()),
        "start": root.start(),
        "end": root.end(),
        "text": root.text(document),
        "children": children,
    })
}
