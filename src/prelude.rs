//! Prelude module for convenient imports
//!
//! ```
//! use lingwah::prelude::*;
//! ```
//!
//! # Re-exported Items
//!
//! ## Engine
//! - [`ParseContext`] - One memoized parse run
//! - [`ParseResults`] - Results of one parser at one position
//! - [`Listener`] / [`DefaultListener`] - Result subscriptions
//! - [`Match`] - Parse-tree node
//! - [`ParseError`] - Positioned match failure
//!
//! ## Grammars
//! - [`Grammar`], [`GrammarBuilder`], [`Parser`], [`ParserId`]
//! - [`Literal`], [`RegularExpression`], [`Sequence`], [`Choice`], [`Optional`]

// ============================================================================
// Engine
// ============================================================================

pub use crate::engine::{
    ContextConfig, DefaultListener, Listener, Match, ParseContext, ParseError, ParseResults,
};

// ============================================================================
// Grammars
// ============================================================================

pub use crate::engine::{
    Choice, Grammar, GrammarBuilder, GrammarError, Literal, Optional, Parser, ParserId,
    RegularExpression, Sequence,
};
