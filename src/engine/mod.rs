//! Evaluation engine
//!
//! # Module Organization
//!
//! ## Core
//! - [`matches`] - [`Match`], immutable parse-tree nodes
//! - [`error`] - [`ParseError`] and setup errors
//! - [`results`] - [`ParseResults`] accumulators and the [`Listener`] protocol
//! - [`context`] - [`ParseContext`], one memoized parse run
//! - [`cache`] - [`MemoTable`], the dense (position, parser) table
//!
//! ## Grammars
//! - [`grammar`] - [`Grammar`], [`GrammarBuilder`], the [`Parser`] trait
//! - [`parsers`] - literal, regex, sequence, choice, optional
//! - [`regex_cache`] - shared compiled patterns
//!
//! ## Diagnostics
//! - [`source_location`] - line/column resolution
//! - [`debug`] - tree printing and JSON export
//!
//! ## Batch
//! - [`parallel`] - many documents against one grammar

// ============================================================================
// Module Declarations
// ============================================================================

pub mod cache;
pub mod context;
pub mod debug;
pub mod error;
pub mod grammar;
pub mod matches;
pub mod parallel;
pub mod parsers;
pub mod regex_cache;
pub mod results;
pub mod source_location;

// ============================================================================
// Core Types
// ============================================================================

pub use cache::{MemoEntry, MemoTable, MAX_PRESIZED_ENTRIES};
pub use context::{parse_document, ContextConfig, ContextId, ParseContext};
pub use error::{ContextError, DocumentError, GrammarError, ParseError};
pub use matches::Match;
pub use results::{DefaultListener, Listener, ParseResults, NO_MATCHES};

// ============================================================================
// Grammars
// ============================================================================

pub use grammar::{Grammar, GrammarBuilder, Parser, ParserId};
pub use parsers::{Choice, Literal, Optional, RegularExpression, Sequence};

// ============================================================================
// Diagnostics
// ============================================================================

pub use debug::{match_to_json, TreePrinter};
pub use source_location::{line_at_offset, SourcePosition, SourceSpan};

// ============================================================================
// Batch
// ============================================================================

pub use parallel::{parse_batch, parse_batch_parallel};
