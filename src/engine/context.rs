//! Parse runs and memoization
//!
//! A [`ParseContext`] is one parse run: a grammar, an immutable document and
//! the cache that guarantees each parser is asked to match each position at
//! most once. [`ParseContext::results_for`] is the engine's entry point.
//!
//! # Example
//!
//! ```
//! use lingwah::engine::{context::ParseContext, grammar::GrammarBuilder};
//!
//! let mut builder = GrammarBuilder::new();
//! let ab = builder.regex("ab").unwrap();
//! let ctx = ParseContext::new(builder.build().unwrap(), "abc").unwrap();
//!
//! let results = ctx.results_for(ab, 0);
//! assert!(results.success());
//! assert_eq!(results.longest_length(), 2);
//!
//! // memoized: the same accumulator comes back
//! assert!(std::sync::Arc::ptr_eq(&results, &ctx.results_for(ab, 0)));
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;

use super::cache::MemoTable;
use super::error::{ContextError, DocumentError, ParseError};
use super::grammar::{Grammar, ParserId};
use super::matches::Match;
use super::results::{ParseResults, NO_MATCHES};

/// Default maximum document size: 100 MB
pub const DEFAULT_MAX_INPUT_SIZE: usize = 100 * 1024 * 1024;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a parse run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ContextId(u64);

impl ContextId {
    pub(crate) fn next() -> Self {
        ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx{}", self.0)
    }
}

/// Configuration for a parse run
///
/// # Example
///
/// ```rust
/// use lingwah::engine::context::ContextConfig;
///
/// let config = ContextConfig::new()
///     .with_max_input_size(1024 * 1024)
///     .with_initial_cache_capacity(4096);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextConfig {
    /// Maximum allowed document size in bytes (0 = unlimited)
    pub max_input_size: usize,

    /// Initial memo table size hint (0 = derive from document and grammar)
    ///
    /// Hints above [`MAX_PRESIZED_ENTRIES`](super::cache::MAX_PRESIZED_ENTRIES)
    /// are clamped; the table still grows past that on demand.
    pub initial_cache_capacity: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
            initial_cache_capacity: 0,
        }
    }
}

impl ContextConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum document size
    pub fn with_max_input_size(mut self, size: usize) -> Self {
        self.max_input_size = size;
        self
    }

    /// Set the initial memo table size hint
    pub fn with_initial_cache_capacity(mut self, entries: usize) -> Self {
        self.initial_cache_capacity = entries;
        self
    }
}

pub(crate) struct ContextInner {
    id: ContextId,
    document: Arc<str>,
    grammar: Arc<Grammar>,
    config: ContextConfig,
    cache: Mutex<MemoTable<Arc<ParseResults>>>,
}

/// One parse run over one document
///
/// Cloning is cheap and yields a handle to the same run. Accumulators refer
/// back to their context weakly, so the run is released once the last handle
/// is dropped.
///
/// # Recursion depth
///
/// Matches travel through nested, synchronous listener calls. A
/// left-recursive rule adds a group of stack frames for every byte it
/// consumes, so `R ::= R 'a' | 'a'` overflows an 8 MB stack after a few
/// thousand bytes (and a spawned thread's 2 MB default sooner). The
/// `max_input_size` limit does not account for this. Run deeply recursive
/// parses on a thread with a larger stack, see
/// [`std::thread::Builder::stack_size`].
#[derive(Clone)]
pub struct ParseContext {
    inner: Arc<ContextInner>,
}

impl ParseContext {
    /// Create a run with [`ContextConfig::default`]
    ///
    /// # Errors
    /// Returns `ContextError::InputTooLarge` if the document exceeds the
    /// default size limit.
    pub fn new(
        grammar: impl Into<Arc<Grammar>>,
        document: impl Into<Arc<str>>,
    ) -> Result<Self, ContextError> {
        Self::with_config(grammar, document, ContextConfig::default())
    }

    /// Create a run with explicit configuration
    ///
    /// # Errors
    /// Returns `ContextError::InputTooLarge` if the document exceeds
    /// `config.max_input_size`.
    pub fn with_config(
        grammar: impl Into<Arc<Grammar>>,
        document: impl Into<Arc<str>>,
        config: ContextConfig,
    ) -> Result<Self, ContextError> {
        let grammar = grammar.into();
        let document = document.into();

        if config.max_input_size > 0 && document.len() > config.max_input_size {
            return Err(ContextError::InputTooLarge {
                input_size: document.len(),
                max_size: config.max_input_size,
            });
        }

        let cache = if config.initial_cache_capacity > 0 {
            MemoTable::new(config.initial_cache_capacity)
        } else {
            MemoTable::for_input(document.len(), grammar.len())
        };

        let id = ContextId::next();
        log_debug!(
            "Created parse context {}: input_len={}, parsers={}",
            id,
            document.len(),
            grammar.len()
        );

        Ok(Self {
            inner: Arc::new(ContextInner {
                id,
                document,
                grammar,
                config,
                cache: Mutex::new(cache),
            }),
        })
    }

    pub(crate) fn from_inner(inner: Arc<ContextInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<ContextInner> {
        Arc::downgrade(&self.inner)
    }

    #[inline]
    fn cache(&self) -> MutexGuard<'_, MemoTable<Arc<ParseResults>>> {
        self.inner
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Results of `parser` at `position`, evaluating it on first request
    ///
    /// The first request for a pair creates the accumulator, stores it in the
    /// cache and only then asks the parser to start matching into it. A
    /// request for the same pair made while that parser is still running
    /// (recursion) gets the same, partially filled accumulator back instead of
    /// starting another evaluation; the caller subscribes to it to learn about
    /// matches found later. Every request for a pair returns the same object.
    pub fn results_for(&self, parser: ParserId, position: usize) -> Arc<ParseResults> {
        let (results, existed) = {
            let mut cache = self.cache();
            let (results, existed) = cache.get_or_insert_with(position, parser, || {
                Arc::new(ParseResults::new(self, parser, position))
            });
            (Arc::clone(results), existed)
        };
        if existed {
            return results;
        }

        if position > self.inner.document.len() {
            results.set_error_message("Position is beyond the end of the input");
            return results;
        }

        match self.inner.grammar.parser(parser) {
            Some(p) => {
                log_debug!("Evaluating {} at {}", self.inner.grammar.describe(parser), position);
                p.start_matching(self, position, &results);
            }
            None => results.set_error_message(format!("Unknown parser {}", parser)),
        }

        results
    }

    /// Results of `parser` at `position` if they were already requested
    ///
    /// Never evaluates anything; the lookup counts toward
    /// [`cache_stats`](Self::cache_stats).
    pub fn cached(&self, parser: ParserId, position: usize) -> Option<Arc<ParseResults>> {
        self.cache().get(position, parser).cloned()
    }

    /// The furthest-position error recorded anywhere in this run
    ///
    /// This is the deepest point the grammar reached before giving up and
    /// usually the most useful diagnostic when nothing matched. Among errors
    /// at the same position the one recorded by the earliest-created
    /// accumulator wins.
    pub fn furthest_error(&self) -> Option<ParseError> {
        let all: Vec<Arc<ParseResults>> =
            self.cache().entries().map(|e| Arc::clone(&e.value)).collect();

        let mut furthest: Option<ParseError> = None;
        for error in all.iter().filter_map(|r| r.error()) {
            if furthest.as_ref().map_or(true, |f| f.position < error.position) {
                furthest = Some(error);
            }
        }
        furthest
    }

    /// Match the whole document against `root`
    ///
    /// # Errors
    /// When no match of `root` at 0 covers the document: an `Unexpected
    /// input` error at the end of the longest partial match, or the run's
    /// furthest error if that got further.
    pub fn parse_complete(&self, root: ParserId) -> Result<Arc<Match>, ParseError> {
        let results = self.results_for(root, 0);
        let len = self.inner.document.len();

        if let Some(full) = results.matches().into_iter().find(|m| m.end() == len) {
            log_debug!("Parse successful: consumed all input");
            return Ok(full);
        }

        let furthest = self.furthest_error();
        let error = match results.longest_match() {
            Some(longest) => match furthest {
                Some(e) if e.position > longest.end() => e,
                _ => ParseError::new(self.id(), root, "Unexpected input", longest.end()),
            },
            None => furthest.unwrap_or_else(|| ParseError::new(self.id(), root, NO_MATCHES, 0)),
        };

        log_debug!("Parse failed: {}", error);
        Err(error)
    }

    /// The document being parsed
    #[inline]
    pub fn document(&self) -> &str {
        &self.inner.document
    }

    /// The grammar being applied
    #[inline]
    pub fn grammar(&self) -> &Arc<Grammar> {
        &self.inner.grammar
    }

    /// Identity of this run
    #[inline]
    pub fn id(&self) -> ContextId {
        self.inner.id
    }

    /// Configuration of this run
    #[inline]
    pub fn config(&self) -> &ContextConfig {
        &self.inner.config
    }

    /// Text covered by `m`
    pub fn text(&self, m: &Match) -> &str {
        m.text(&self.inner.document)
    }

    /// Number of (parser, position) pairs evaluated so far
    pub fn cached_len(&self) -> usize {
        self.cache().len()
    }

    /// Memo table (hits, misses, hit rate)
    pub fn cache_stats(&self) -> (u64, u64, f64) {
        self.cache().stats()
    }
}

impl fmt::Debug for ParseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseContext")
            .field("id", &self.inner.id)
            .field("input_len", &self.inner.document.len())
            .field("cached", &self.cached_len())
            .finish()
    }
}

/// Create a context for `document` and match it completely against `root`
///
/// # Errors
/// [`DocumentError::Context`] if the context cannot be created,
/// [`DocumentError::Parse`] if the document does not match.
pub fn parse_document(
    grammar: &Arc<Grammar>,
    root: ParserId,
    document: &str,
) -> Result<Arc<Match>, DocumentError> {
    let ctx = ParseContext::new(Arc::clone(grammar), document)?;
    Ok(ctx.parse_complete(root)?)
}
