//! Grammar arena
//!
//! Every parser lives in a [`Grammar`] and is addressed by a [`ParserId`].
//! Composite parsers hold ids of their sub-parsers rather than references, so
//! a cyclic grammar (a rule that refers to itself, directly or through other
//! rules) is an ordinary vector of parsers with no reference cycles.
//!
//! Cycles are built by declaring a rule first and defining it later:
//!
//! ```
//! use lingwah::engine::grammar::GrammarBuilder;
//! use lingwah::engine::parsers::Choice;
//!
//! // R ::= R 'a' | 'a'
//! let mut builder = GrammarBuilder::new();
//! let r = builder.declare("R");
//! let a = builder.literal("a");
//! let r_a = builder.sequence([r, a]);
//! builder.define(r, Choice::new([r_a, a])).unwrap();
//! let grammar = builder.build().unwrap();
//!
//! assert_eq!(grammar.find("R"), Some(r));
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::context::ParseContext;
use super::error::GrammarError;
use super::parsers::{Choice, Literal, Optional, RegularExpression, Sequence};
use super::results::ParseResults;

/// Identity of a parser within its grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParserId(pub(crate) usize);

impl ParserId {
    /// Index of the parser in its grammar
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ParserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something that can attempt to match the document at a position
///
/// The engine calls [`start_matching`](Parser::start_matching) at most once
/// per position in a parse run, handing over the accumulator for that
/// position. An implementation must:
///
/// - call [`ParseResults::add_match_end`] (or [`ParseResults::add_match`])
///   once per distinct match length it finds at `start`, and/or
///   [`ParseResults::set_error_message`] on failure;
/// - not assume it is the only writer of `results`;
/// - obtain sub-parser results through [`ParseContext::results_for`] and
///   subscribe a listener to react to matches found after that call
///   returns, instead of polling.
///
/// Implementations must be `Send + Sync` because a grammar can be shared
/// between threads.
pub trait Parser: Send + Sync {
    /// Begin matching at `start`, recording outcomes into `results`
    fn start_matching(&self, ctx: &ParseContext, start: usize, results: &Arc<ParseResults>);

    /// Short description used in diagnostics
    fn label(&self) -> String;

    /// Parsers this one evaluates, checked when the grammar is built
    fn references(&self) -> Vec<ParserId> {
        Vec::new()
    }
}

/// An immutable set of parsers addressed by [`ParserId`]
pub struct Grammar {
    parsers: Vec<Box<dyn Parser>>,
    names: Vec<Option<String>>,
}

impl Grammar {
    /// The parser with the given id
    #[inline]
    pub fn parser(&self, id: ParserId) -> Option<&dyn Parser> {
        self.parsers.get(id.0).map(|p| p.as_ref())
    }

    /// Number of parsers
    #[inline]
    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    /// Whether the grammar holds no parsers
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// Rule name given to `id`, if any
    pub fn name(&self, id: ParserId) -> Option<&str> {
        self.names.get(id.0).and_then(|n| n.as_deref())
    }

    /// Look up a named rule
    pub fn find(&self, name: &str) -> Option<ParserId> {
        self.names
            .iter()
            .position(|n| n.as_deref() == Some(name))
            .map(ParserId)
    }

    /// Rule name, or the parser's label, or the bare id
    pub fn describe(&self, id: ParserId) -> String {
        match (self.name(id), self.parser(id)) {
            (Some(name), _) => name.to_string(),
            (None, Some(parser)) => parser.label(),
            (None, None) => id.to_string(),
        }
    }

    /// All ids, in definition order
    pub fn ids(&self) -> impl Iterator<Item = ParserId> {
        (0..self.parsers.len()).map(ParserId)
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.ids().map(|id| format!("{} {}", id, self.describe(id))))
            .finish()
    }
}

struct Slot {
    name: Option<String>,
    parser: Option<Box<dyn Parser>>,
}

/// Incremental builder for a [`Grammar`]
///
/// Each `add`-style method returns the id of the new parser so it can be
/// referenced by later composites.
#[derive(Default)]
pub struct GrammarBuilder {
    slots: Vec<Slot>,
}

impl GrammarBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, name: Option<String>, parser: Option<Box<dyn Parser>>) -> ParserId {
        let id = ParserId(self.slots.len());
        self.slots.push(Slot { name, parser });
        id
    }

    /// Add an anonymous parser
    pub fn add<P: Parser + 'static>(&mut self, parser: P) -> ParserId {
        self.push(None, Some(Box::new(parser)))
    }

    /// Add a named rule
    pub fn rule<P: Parser + 'static>(&mut self, name: impl Into<String>, parser: P) -> ParserId {
        self.push(Some(name.into()), Some(Box::new(parser)))
    }

    /// Reserve an id for a rule that will be defined later
    pub fn declare(&mut self, name: impl Into<String>) -> ParserId {
        self.push(Some(name.into()), None)
    }

    /// Supply the parser for a declared rule
    ///
    /// # Errors
    /// `UnknownParser` if `id` was not issued by this builder,
    /// `AlreadyDefined` if the slot already holds a parser.
    pub fn define<P: Parser + 'static>(&mut self, id: ParserId, parser: P) -> Result<(), GrammarError> {
        let slot = self.slots.get_mut(id.0).ok_or(GrammarError::UnknownParser {
            id,
            referenced_by: id,
        })?;
        if slot.parser.is_some() {
            return Err(GrammarError::AlreadyDefined { id });
        }
        slot.parser = Some(Box::new(parser));
        Ok(())
    }

    /// Add a [`Literal`]
    pub fn literal(&mut self, text: impl Into<String>) -> ParserId {
        self.add(Literal::new(text))
    }

    /// Add a [`RegularExpression`]
    ///
    /// # Errors
    /// `InvalidPattern` if the pattern does not compile.
    pub fn regex(&mut self, pattern: &str) -> Result<ParserId, GrammarError> {
        Ok(self.add(RegularExpression::new(pattern)?))
    }

    /// Add a [`Sequence`]
    pub fn sequence(&mut self, elements: impl IntoIterator<Item = ParserId>) -> ParserId {
        self.add(Sequence::new(elements))
    }

    /// Add a [`Choice`]
    pub fn choice(&mut self, alternatives: impl IntoIterator<Item = ParserId>) -> ParserId {
        self.add(Choice::new(alternatives))
    }

    /// Add an [`Optional`]
    pub fn optional(&mut self, inner: ParserId) -> ParserId {
        self.add(Optional::new(inner))
    }

    /// Finish the grammar
    ///
    /// # Errors
    /// `UndefinedRule` for a declared rule that was never defined,
    /// `UnknownParser` for a reference to an id outside the grammar.
    pub fn build(self) -> Result<Grammar, GrammarError> {
        let count = self.slots.len();
        let mut parsers = Vec::with_capacity(count);
        let mut names = Vec::with_capacity(count);

        for (index, Slot { name, parser }) in self.slots.into_iter().enumerate() {
            let id = ParserId(index);
            let parser = match parser {
                Some(p) => p,
                None => {
                    return Err(GrammarError::UndefinedRule {
                        name: name.unwrap_or_else(|| id.to_string()),
                    })
                }
            };

            if let Some(missing) = parser.references().into_iter().find(|r| r.0 >= count) {
                return Err(GrammarError::UnknownParser {
                    id: missing,
                    referenced_by: id,
                });
            }

            parsers.push(parser);
            names.push(name);
        }

        Ok(Grammar { parsers, names })
    }
}
