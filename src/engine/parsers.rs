//! Standard parsers
//!
//! Two terminals ([`Literal`], [`RegularExpression`]) and three composites
//! ([`Sequence`], [`Choice`], [`Optional`]) built on the engine's public
//! surface only: each one records into the accumulator it is handed,
//! requests sub-parsers through [`ParseContext::results_for`] and subscribes
//! listeners for anything found later. Nothing here is privileged; custom
//! parsers implementing [`Parser`] work the same way.
//!
//! Composites explore every alternative, so ambiguity is preserved across
//! match lengths: `Choice` over `"a"` and `"ab"` at the same position records
//! both a 1-byte and a 2-byte match.

use std::sync::{Arc, Weak};

use regex::Regex;

use super::context::ParseContext;
use super::error::{GrammarError, ParseError};
use super::grammar::{Parser, ParserId};
use super::matches::Match;
use super::regex_cache;
use super::results::{Listener, ParseResults};

/// Matches an exact string
#[derive(Debug, Clone)]
pub struct Literal {
    text: String,
}

impl Literal {
    /// Create a literal parser
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The text to match
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Parser for Literal {
    fn start_matching(&self, ctx: &ParseContext, start: usize, results: &Arc<ParseResults>) {
        let matched = ctx
            .document()
            .get(start..)
            .map_or(false, |rest| rest.starts_with(self.text.as_str()));

        if matched {
            results.add_match_end(start + self.text.len());
        } else {
            results.set_error_message(format!("Expected '{}'", self.text));
        }
    }

    fn label(&self) -> String {
        format!("'{}'", self.text)
    }
}

/// Matches a regular expression anchored at the start position
///
/// Only a match beginning exactly at the start position counts; a match
/// further along the input is a failure.
#[derive(Debug, Clone)]
pub struct RegularExpression {
    pattern: String,
    regex: Regex,
}

impl RegularExpression {
    /// Compile a pattern
    ///
    /// # Errors
    /// `InvalidPattern` if the pattern does not compile.
    pub fn new(pattern: &str) -> Result<Self, GrammarError> {
        let anchored = format!("^(?:{})", pattern);
        let regex =
            regex_cache::get_or_compile(&anchored).map_err(|e| GrammarError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// The pattern as written
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl Parser for RegularExpression {
    fn start_matching(&self, ctx: &ParseContext, start: usize, results: &Arc<ParseResults>) {
        let found = ctx
            .document()
            .get(start..)
            .and_then(|rest| self.regex.find(rest));

        match found {
            Some(m) => results.add_match_end(start + m.end()),
            None => results.set_error_message(format!("Expected {}", self.pattern)),
        }
    }

    fn label(&self) -> String {
        format!("regex('{}')", self.pattern)
    }
}

/// Matches its elements one after another
///
/// Every match of element `i` ending at `e` starts an evaluation of element
/// `i + 1` at `e`, so all combinations of element match lengths are tried.
/// Errors of any element evaluated along the way are forwarded.
#[derive(Debug, Clone)]
pub struct Sequence {
    elements: Arc<[ParserId]>,
}

impl Sequence {
    /// Create a sequence parser
    pub fn new(elements: impl IntoIterator<Item = ParserId>) -> Self {
        Self {
            elements: elements.into_iter().collect::<Vec<_>>().into(),
        }
    }
}

impl Parser for Sequence {
    fn start_matching(&self, ctx: &ParseContext, start: usize, results: &Arc<ParseResults>) {
        if self.elements.is_empty() {
            results.add_match(Match::empty(results.matcher(), start));
            return;
        }

        SequenceStep {
            destination: Arc::downgrade(results),
            elements: Arc::clone(&self.elements),
            start,
            index: 0,
            prefix: Vec::new(),
        }
        .subscribe(ctx, start);
    }

    fn label(&self) -> String {
        "sequence".to_string()
    }

    fn references(&self) -> Vec<ParserId> {
        self.elements.to_vec()
    }
}

/// Waits for matches of one element of a sequence
struct SequenceStep {
    destination: Weak<ParseResults>,
    elements: Arc<[ParserId]>,
    /// Where the whole sequence started
    start: usize,
    /// Element this step listens to
    index: usize,
    /// Matches of the elements before `index`
    prefix: Vec<Arc<Match>>,
}

impl SequenceStep {
    fn subscribe(self, ctx: &ParseContext, position: usize) {
        let element = ctx.results_for(self.elements[self.index], position);
        let step = Arc::new(self);
        element.add_listener(Arc::clone(&step) as Arc<dyn Listener>);
        if let Some(error) = element.error() {
            step.forward_error(error);
        }
    }

    fn forward_error(&self, error: ParseError) {
        if let Some(destination) = self.destination.upgrade() {
            destination.set_error(error);
        }
    }
}

impl Listener for SequenceStep {
    fn on_match_found(&self, _results: &ParseResults, found: &Arc<Match>) {
        let Some(destination) = self.destination.upgrade() else {
            return;
        };

        let mut children = Vec::with_capacity(self.index + 1);
        children.extend(self.prefix.iter().cloned());
        children.push(Arc::clone(found));

        if self.index + 1 == self.elements.len() {
            destination.add_match(Match::composite(destination.matcher(), self.start, children));
        } else if let Some(ctx) = destination.context() {
            SequenceStep {
                destination: Arc::downgrade(&destination),
                elements: Arc::clone(&self.elements),
                start: self.start,
                index: self.index + 1,
                prefix: children,
            }
            .subscribe(&ctx, found.end());
        }
    }

    fn on_match_error(&self, _results: &ParseResults, error: &ParseError) {
        self.forward_error(error.clone());
    }
}

/// Matches any of its alternatives
///
/// All alternatives are evaluated and every match is kept (one per length).
#[derive(Debug, Clone)]
pub struct Choice {
    alternatives: Vec<ParserId>,
}

impl Choice {
    /// Create a choice parser
    pub fn new(alternatives: impl IntoIterator<Item = ParserId>) -> Self {
        Self {
            alternatives: alternatives.into_iter().collect(),
        }
    }
}

impl Parser for Choice {
    fn start_matching(&self, ctx: &ParseContext, start: usize, results: &Arc<ParseResults>) {
        if self.alternatives.is_empty() {
            results.set_error_message("No alternatives to match");
            return;
        }

        for &alternative in &self.alternatives {
            ctx.results_for(alternative, start).forward_to(results);
        }
    }

    fn label(&self) -> String {
        "choice".to_string()
    }

    fn references(&self) -> Vec<ParserId> {
        self.alternatives.clone()
    }
}

/// Matches its inner parser or nothing
#[derive(Debug, Clone, Copy)]
pub struct Optional {
    inner: ParserId,
}

impl Optional {
    /// Create an optional parser
    pub fn new(inner: ParserId) -> Self {
        Self { inner }
    }
}

impl Parser for Optional {
    fn start_matching(&self, ctx: &ParseContext, start: usize, results: &Arc<ParseResults>) {
        results.add_match_end(start);
        ctx.results_for(self.inner, start).forward_to(results);
    }

    fn label(&self) -> String {
        "optional".to_string()
    }

    fn references(&self) -> Vec<ParserId> {
        vec![self.inner]
    }
}
