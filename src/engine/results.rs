//! Per-(parser, position) result accumulators
//!
//! A [`ParseResults`] collects every distinct match one parser finds at one
//! position, plus the most informative failure, and pushes each new item to
//! the [`Listener`]s subscribed to it. Listeners that subscribe late are
//! replayed the matches stored so far, so a subscriber never has to care
//! whether it arrived before or after the results were computed.
//!
//! This push model is what lets a parser evaluate a rule that is already in
//! flight (left recursion, mutual recursion): the re-entrant request gets the
//! same, possibly still empty accumulator, subscribes, and is told about
//! matches as the outer evaluation discovers them.
//!
//! # Locking
//!
//! Each accumulator holds one reentrant lock for the whole of `add_match`,
//! `set_error` and `add_listener`, callbacks included. A broadcast therefore
//! never interleaves with a mutation from another thread, and registering a
//! listener plus replaying the stored matches is atomic against concurrent
//! `add_match` calls: a new listener sees every match exactly once. The lock
//! is reentrant because callbacks on the same thread re-enter the
//! accumulator constantly in cyclic grammars; the inner `RefCell` borrow is
//! always released before a callback runs.
//!
//! Two threads that forward into each other's accumulators can deadlock.
//! Evaluate independent documents in separate contexts instead (see
//! [`parse_batch_parallel`](super::parallel::parse_batch_parallel)).

use std::cell::RefCell;
use std::fmt;
use std::sync::{Arc, Weak};

use hashbrown::HashSet;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

use super::context::{ContextId, ContextInner, ParseContext};
use super::error::ParseError;
use super::grammar::ParserId;
use super::matches::Match;

/// Message reported when a parser recorded neither a match nor an error
pub const NO_MATCHES: &str = "No matches found";

/// Observer of a [`ParseResults`]
///
/// Implementations must be `Send + Sync`; they are stored inside the
/// accumulator they observe.
pub trait Listener: Send + Sync {
    /// A match not previously seen by this listener was recorded
    fn on_match_found(&self, results: &ParseResults, found: &Arc<Match>);

    /// An error not previously recorded by `results` was delivered
    fn on_match_error(&self, results: &ParseResults, error: &ParseError);
}

/// Forwards every match and error into another accumulator
///
/// This is how a composite parser assembles its own results from a
/// sub-parser's: matches arrive re-attributed to the destination's parser
/// (see [`ParseResults::add_match`]). The destination is held weakly; the
/// context's cache is what keeps accumulators alive.
#[derive(Debug)]
pub struct DefaultListener {
    destination: Weak<ParseResults>,
}

impl DefaultListener {
    /// Forward into `destination`
    pub fn new(destination: &Arc<ParseResults>) -> Self {
        Self {
            destination: Arc::downgrade(destination),
        }
    }

    /// The destination, if it is still alive
    pub fn destination(&self) -> Option<Arc<ParseResults>> {
        self.destination.upgrade()
    }
}

impl Listener for DefaultListener {
    fn on_match_found(&self, _results: &ParseResults, found: &Arc<Match>) {
        if let Some(destination) = self.destination.upgrade() {
            destination.add_match(Arc::clone(found));
        }
    }

    fn on_match_error(&self, _results: &ParseResults, error: &ParseError) {
        if let Some(destination) = self.destination.upgrade() {
            destination.set_error(error.clone());
        }
    }
}

#[derive(Default)]
struct State {
    /// At most one match per length, in the order they were recorded
    matches: Vec<Arc<Match>>,
    /// Furthest-position error seen so far
    best_error: Option<ParseError>,
    /// Every error ever delivered, for duplicate suppression
    seen_errors: HashSet<ParseError>,
    /// Registered listeners, by identity, in registration order
    listeners: Vec<Arc<dyn Listener>>,
}

/// Results of applying one parser at one position
///
/// Created by [`ParseContext::results_for`] and owned by the context's cache
/// for the rest of the parse run.
pub struct ParseResults {
    context: Weak<ContextInner>,
    context_id: ContextId,
    matcher: ParserId,
    position: usize,
    state: ReentrantMutex<RefCell<State>>,
}

impl ParseResults {
    pub(crate) fn new(context: &ParseContext, matcher: ParserId, position: usize) -> Self {
        Self {
            context: context.downgrade(),
            context_id: context.id(),
            matcher,
            position,
            state: ReentrantMutex::new(RefCell::new(State::default())),
        }
    }

    #[inline]
    fn lock(&self) -> ReentrantMutexGuard<'_, RefCell<State>> {
        self.state.lock()
    }

    /// Record a match and notify every current listener
    ///
    /// A match produced by another parser is first wrapped into a match
    /// attributed to this accumulator's parser, so every stored match has
    /// `parser() == self.matcher()`. The call is a no-op when a match of the
    /// same length is already stored; an equal match necessarily has the same
    /// length, so this also drops exact duplicates. Listeners have all been
    /// called by the time this returns.
    pub fn add_match(&self, found: Arc<Match>) {
        let found = if found.parser() == self.matcher {
            found
        } else {
            Match::wrap(self.matcher, found)
        };

        let guard = self.lock();
        let listeners = {
            let mut state = guard.borrow_mut();
            if state.matches.iter().any(|m| m.length() == found.length()) {
                return;
            }
            state.matches.push(Arc::clone(&found));
            state.listeners.clone()
        };

        for listener in &listeners {
            listener.on_match_found(self, &found);
        }
    }

    /// Record a terminal match from this position up to `end`
    ///
    /// An `end` before this accumulator's position is a bug in the calling
    /// parser; it is recorded as an error instead of a match.
    pub fn add_match_end(&self, end: usize) {
        if end < self.position {
            log_debug!(
                "{} reported a match ending at {} before its start {}",
                self.matcher,
                end,
                self.position
            );
            self.set_error_message(format!(
                "Match ends at {} before its start {}",
                end, self.position
            ));
            return;
        }
        self.add_match(Match::terminal(self.matcher, self.position, end));
    }

    /// Record an error and notify every current listener
    ///
    /// An error equal to one already delivered here is dropped without
    /// notifying anyone. This is what terminates error propagation around a
    /// cycle of parsers that keep re-deriving the same failure.
    pub fn set_error(&self, error: ParseError) {
        let guard = self.lock();
        let listeners = {
            let mut state = guard.borrow_mut();
            if !state.seen_errors.insert(error.clone()) {
                return;
            }
            let further = state
                .best_error
                .as_ref()
                .map_or(true, |best| best.position < error.position);
            if further {
                state.best_error = Some(error.clone());
            }
            state.listeners.clone()
        };

        for listener in &listeners {
            listener.on_match_error(self, &error);
        }
    }

    /// Record an error at this accumulator's position
    pub fn set_error_message(&self, message: impl Into<String>) {
        self.set_error_at(message, self.position);
    }

    /// Record an error at an explicit position
    pub fn set_error_at(&self, message: impl Into<String>, position: usize) {
        self.set_error(ParseError::new(
            self.context_id,
            self.matcher,
            message,
            position,
        ));
    }

    /// Subscribe `listener` and replay the matches stored so far
    ///
    /// Registering the same listener (by identity) twice is a no-op. Errors
    /// recorded before registration are not replayed; see
    /// [`forward_to`](Self::forward_to) for a subscription that also carries
    /// the current best error over.
    pub fn add_listener(&self, listener: Arc<dyn Listener>) {
        let guard = self.lock();
        let replay = {
            let mut state = guard.borrow_mut();
            if state.listeners.iter().any(|l| same_listener(l, &listener)) {
                return;
            }
            state.listeners.push(Arc::clone(&listener));
            state.matches.clone()
        };

        for found in &replay {
            listener.on_match_found(self, found);
        }
    }

    /// Forward every match and error of this accumulator into `destination`
    ///
    /// Subscribes a [`DefaultListener`] and also delivers the current best
    /// error, which replay alone would miss.
    pub fn forward_to(&self, destination: &Arc<ParseResults>) {
        let _guard = self.lock();
        self.add_listener(Arc::new(DefaultListener::new(destination)));
        if let Some(error) = self.error() {
            destination.set_error(error);
        }
    }

    /// Whether at least one match has been recorded
    pub fn success(&self) -> bool {
        !self.lock().borrow().matches.is_empty()
    }

    /// Snapshot of the stored matches, in recording order
    pub fn matches(&self) -> Vec<Arc<Match>> {
        self.lock().borrow().matches.clone()
    }

    /// The match covering the most input; the first recorded wins ties
    pub fn longest_match(&self) -> Option<Arc<Match>> {
        let guard = self.lock();
        let state = guard.borrow();
        let mut longest: Option<&Arc<Match>> = None;
        for m in &state.matches {
            if longest.map_or(true, |l| l.length() < m.length()) {
                longest = Some(m);
            }
        }
        longest.cloned()
    }

    /// Length of the longest match, 0 without matches
    pub fn longest_length(&self) -> usize {
        self.lock()
            .borrow()
            .matches
            .iter()
            .map(|m| m.length())
            .max()
            .unwrap_or(0)
    }

    /// The furthest-position error recorded so far
    pub fn error(&self) -> Option<ParseError> {
        self.lock().borrow().best_error.clone()
    }

    /// Message of the best error
    ///
    /// [`NO_MATCHES`] when nothing at all was recorded, empty when there are
    /// matches but no error.
    pub fn error_message(&self) -> String {
        let guard = self.lock();
        let state = guard.borrow();
        match &state.best_error {
            Some(error) => error.message.clone(),
            None if state.matches.is_empty() => NO_MATCHES.to_string(),
            None => String::new(),
        }
    }

    /// Position of the best error as text, `"unknown"` without an error
    pub fn error_position(&self) -> String {
        match self.error() {
            Some(error) => error.position.to_string(),
            None => "unknown".to_string(),
        }
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.lock().borrow().listeners.len()
    }

    /// The parser these results belong to
    #[inline]
    pub fn matcher(&self) -> ParserId {
        self.matcher
    }

    /// The position these results belong to
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// The parse run these results belong to
    #[inline]
    pub fn context_id(&self) -> ContextId {
        self.context_id
    }

    /// The owning context, while it is alive
    pub fn context(&self) -> Option<ParseContext> {
        self.context.upgrade().map(ParseContext::from_inner)
    }
}

fn same_listener(a: &Arc<dyn Listener>, b: &Arc<dyn Listener>) -> bool {
    // compare data pointers only; vtable pointers are not unique
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

impl fmt::Debug for ParseResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.lock();
        let state = guard.borrow();
        f.debug_struct("ParseResults")
            .field("matcher", &self.matcher)
            .field("position", &self.position)
            .field("matches", &state.matches.len())
            .field("best_error", &state.best_error)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

impl fmt::Display for ParseResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let matches = self.matches();
        if matches.is_empty() {
            return match self.error() {
                Some(error) => write!(
                    f,
                    "Failed at position {}: {}",
                    error.position, error.message
                ),
                None => write!(f, "Failed at position {}: {}", self.position, NO_MATCHES),
            };
        }

        let context = self.context();
        let text = |m: &Match| match &context {
            Some(ctx) => ctx.text(m).to_string(),
            None => format!("[{}..{})", m.start(), m.end()),
        };

        write!(f, "Success, matched {}", text(matches[0].as_ref()))?;
        for m in &matches[1..] {
            write!(f, "\nand {}", text(m.as_ref()))?;
        }
        Ok(())
    }
}
