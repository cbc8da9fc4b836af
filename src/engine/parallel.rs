//! Batch parsing
//!
//! Parses many independent documents against one grammar. Each document gets
//! its own [`ParseContext`](super::context::ParseContext); the grammar is
//! shared read-only.
//!
//! With the `parallel` feature the batch runs on rayon's thread pool,
//! otherwise sequentially. Results are in input order either way.
//!
//! ```rust
//! use std::sync::Arc;
//! use lingwah::engine::{grammar::GrammarBuilder, parallel::parse_batch_parallel};
//!
//! let mut builder = GrammarBuilder::new();
//! let word = builder.regex("[a-z]+").unwrap();
//! let grammar = Arc::new(builder.build().unwrap());
//!
//! let results = parse_batch_parallel(&grammar, word, &["abc", "de", "F"]);
//! assert!(results[0].is_ok());
//! assert!(results[2].is_err());
//! ```

use std::sync::Arc;

use super::context::parse_document;
use super::error::DocumentError;
use super::grammar::{Grammar, ParserId};
use super::matches::Match;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Parse every document completely against `root`, in parallel
#[cfg(feature = "parallel")]
pub fn parse_batch_parallel(
    grammar: &Arc<Grammar>,
    root: ParserId,
    documents: &[&str],
) -> Vec<Result<Arc<Match>, DocumentError>> {
    documents
        .par_iter()
        .map(|document| parse_document(grammar, root, document))
        .collect()
}

/// Parse every document completely against `root` (sequential fallback)
#[cfg(not(feature = "parallel"))]
pub fn parse_batch_parallel(
    grammar: &Arc<Grammar>,
    root: ParserId,
    documents: &[&str],
) -> Vec<Result<Arc<Match>, DocumentError>> {
    parse_batch(grammar, root, documents)
}

/// Parse every document completely against `root`, one after another
pub fn parse_batch(
    grammar: &Arc<Grammar>,
    root: ParserId,
    documents: &[&str],
) -> Vec<Result<Arc<Match>, DocumentError>> {
    documents
        .iter()
        .map(|document| parse_document(grammar, root, document))
        .collect()
}
