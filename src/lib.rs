//! Lingwah - memoizing parser-combinator engine
//!
//! Lingwah evaluates composable parsers over a document, memoizing results
//! per (parser, position) so no parser ever matches the same position twice
//! in one run. Grammars may be directly or mutually left-recursive: a
//! recursive request for a rule that is already being evaluated gets the
//! in-flight results back and subscribes to them, and matches flow to every
//! subscriber as they are discovered.
//!
//! It provides:
//! - [`ParseContext`], the per-run memo cache and entry point
//! - [`ParseResults`], per-position match accumulators with listener fan-out
//! - the [`Parser`] trait for terminal and composite parsers
//! - a small standard parser set (literal, regex, sequence, choice, optional)
//! - diagnostics (furthest-failure errors, line/column, tree printing)
//!
//! ## Quick Start
//!
//! ```rust
//! use lingwah::{Choice, GrammarBuilder, ParseContext};
//!
//! // R ::= R 'a' | 'a'
//! let mut builder = GrammarBuilder::new();
//! let r = builder.declare("R");
//! let a = builder.literal("a");
//! let r_a = builder.sequence([r, a]);
//! builder.define(r, Choice::new([r_a, a])).unwrap();
//!
//! let ctx = ParseContext::new(builder.build().unwrap(), "aaa").unwrap();
//! let results = ctx.results_for(r, 0);
//! assert_eq!(results.matches().len(), 3);
//! assert_eq!(results.longest_length(), 3);
//! ```
//!
//! ## Feature Flags
//!
//! - `logging` - Enable debug logging using the `log` crate
//! - `parallel` - Parse document batches on rayon's thread pool

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

/// Logging macros - no-op when logging feature is disabled
#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

/// Logging macros - use log crate when logging feature is enabled
#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

// Prelude module for convenient imports
pub mod prelude;

pub mod engine;

/// Re-export commonly used types for convenience
pub use engine::{
    // Diagnostics
    debug::{match_to_json, TreePrinter},
    source_location::{SourcePosition, SourceSpan},
    // Standard parsers
    parsers::{Choice, Literal, Optional, RegularExpression, Sequence},
    // Batch
    parallel::{parse_batch, parse_batch_parallel},
    parse_document,
    ContextConfig,
    ContextError,
    ContextId,
    DefaultListener,
    DocumentError,
    Grammar,
    GrammarBuilder,
    GrammarError,
    Listener,
    Match,
    ParseContext,
    ParseError,
    ParseResults,
    Parser,
    ParserId,
};
