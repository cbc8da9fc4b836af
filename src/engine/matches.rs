//! Parse-result tree nodes
//!
//! A [`Match`] is evidence that a parser succeeded over a half-open byte range
//! of the document. Matches are immutable once built and shared through
//! `Arc`, so one node can be held by the accumulator that found it and by any
//! number of parent matches at the same time.
//!
//! The parser graph that produces matches may be cyclic; match trees never
//! are, since a parent can only be built from children that already exist.

use std::sync::Arc;

use serde::Serialize;

use super::grammar::ParserId;

/// A successful match of one parser over `[start, end)`
///
/// Equality and hashing are structural: two matches are equal when they have
/// the same parser, span and (recursively) children.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Match {
    parser: ParserId,
    start: usize,
    end: usize,
    children: Vec<Arc<Match>>,
}

impl Match {
    /// A leaf match with no children
    ///
    /// `end` must not precede `start`; [`ParseResults::add_match_end`]
    /// rejects such spans before they get here. Release builds clamp `end`
    /// to `start` if one slips through.
    ///
    /// [`ParseResults::add_match_end`]: super::results::ParseResults::add_match_end
    pub fn terminal(parser: ParserId, start: usize, end: usize) -> Arc<Match> {
        debug_assert!(start <= end, "match ends before it starts");
        Arc::new(Match {
            parser,
            start,
            end: end.max(start),
            children: Vec::new(),
        })
    }

    /// A zero-length match at `at`
    pub fn empty(parser: ParserId, at: usize) -> Arc<Match> {
        Match::terminal(parser, at, at)
    }

    /// Attribute `delegate` to `parser`, keeping its span
    ///
    /// The delegate becomes the only child so the derivation stays
    /// inspectable.
    pub fn wrap(parser: ParserId, delegate: Arc<Match>) -> Arc<Match> {
        Arc::new(Match {
            parser,
            start: delegate.start,
            end: delegate.end,
            children: vec![delegate],
        })
    }

    /// A match built from an ordered list of adjacent children
    ///
    /// The span runs from `start` to the end of the last child. With no
    /// children the match is empty at `start`.
    pub fn composite(parser: ParserId, start: usize, children: Vec<Arc<Match>>) -> Arc<Match> {
        debug_assert!(children.first().map_or(true, |c| c.start == start));
        let end = children.last().map_or(start, |c| c.end);
        Arc::new(Match {
            parser,
            start,
            end,
            children,
        })
    }

    /// The parser that produced this match
    #[inline]
    pub fn parser(&self) -> ParserId {
        self.parser
    }

    /// Start offset (inclusive)
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// End offset (exclusive)
    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of bytes covered
    #[inline]
    pub fn length(&self) -> usize {
        self.end - self.start
    }

    /// Whether the match covers no input
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Child matches, in document order
    #[inline]
    pub fn children(&self) -> &[Arc<Match>] {
        &self.children
    }

    /// The matched slice of `document`
    ///
    /// Returns an empty string if the span does not fit `document`.
    pub fn text<'d>(&self, document: &'d str) -> &'d str {
        document.get(self.start..self.end).unwrap_or("")
    }

    /// Every node in this tree produced by `parser`, pre-order
    pub fn find_all(&self, parser: ParserId) -> Vec<&Match> {
        let mut found = Vec::new();
        self.collect_by_parser(parser, &mut found);
        found
    }

    fn collect_by_parser<'m>(&'m self, parser: ParserId, found: &mut Vec<&'m Match>) {
        if self.parser == parser {
            found.push(self);
        }
        for child in &self.children {
            child.collect_by_parser(parser, found);
        }
    }

    /// Number of nodes in this tree, including this one
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }
}
