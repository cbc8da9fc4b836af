//! Error types
//!
//! [`ParseError`] is the only kind of failure the engine itself produces: a
//! positioned "this parser did not match here" record. It is data, recorded
//! into a [`ParseResults`](super::results::ParseResults) and broadcast to
//! listeners, never returned through the engine API as an `Err`.
//!
//! [`GrammarError`] and [`ContextError`] cover the setup steps around a parse
//! run (building a grammar, creating a context).

use std::fmt;

use serde::Serialize;

use super::context::ContextId;
use super::grammar::ParserId;
use super::source_location::SourcePosition;

/// A failed match attempt at a position
///
/// Two errors are equal when position, message, parser and context all
/// match. Accumulators rely on this to drop re-deliveries of an error they
/// have already seen, which is what stops error propagation from looping
/// forever through a self-referential grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ParseError {
    /// Byte offset in the document where matching failed
    pub position: usize,
    /// Human-readable description of the failure
    pub message: String,
    /// The parser that reported the failure
    pub parser: ParserId,
    /// The parse run the failure belongs to
    pub context: ContextId,
}

impl ParseError {
    /// Create a new error
    pub fn new(
        context: ContextId,
        parser: ParserId,
        message: impl Into<String>,
        position: usize,
    ) -> Self {
        Self {
            position,
            message: message.into(),
            parser,
            context,
        }
    }

    /// Line/column of the failure within `document`
    pub fn source_position(&self, document: &str) -> SourcePosition {
        SourcePosition::from_offset(document, self.position)
    }

    /// Render the error with line/column information
    pub fn format_with_source(&self, document: &str) -> String {
        let sp = self.source_position(document);
        format!(
            "Error at line {}, column {}: {}",
            sp.line, sp.column, self.message
        )
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{parser:{},position:{},message:{}}}",
            self.parser, self.position, self.message
        )
    }
}

impl std::error::Error for ParseError {}

/// Errors raised while assembling a [`Grammar`](super::grammar::Grammar)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// A rule was declared but never given a parser
    UndefinedRule {
        /// Name (or id) of the declared rule
        name: String,
    },

    /// A rule was defined twice
    AlreadyDefined {
        /// The slot that already holds a parser
        id: ParserId,
    },

    /// A parser refers to an id that does not exist in the grammar
    UnknownParser {
        /// The missing id
        id: ParserId,
        /// The parser holding the dangling reference
        referenced_by: ParserId,
    },

    /// A regular expression failed to compile
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Compiler diagnostic
        reason: String,
    },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::UndefinedRule { name } => {
                write!(f, "Rule '{}' was declared but never defined", name)
            }
            GrammarError::AlreadyDefined { id } => {
                write!(f, "Parser {} is already defined", id)
            }
            GrammarError::UnknownParser { id, referenced_by } => {
                write!(
                    f,
                    "Parser {} refers to unknown parser {}",
                    referenced_by, id
                )
            }
            GrammarError::InvalidPattern { pattern, reason } => {
                write!(f, "Invalid pattern '{}': {}", pattern, reason)
            }
        }
    }
}

impl std::error::Error for GrammarError {}

/// Errors raised when creating a [`ParseContext`](super::context::ParseContext)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// Document exceeds the configured size limit
    InputTooLarge {
        /// Size of the document in bytes
        input_size: usize,
        /// Maximum allowed size
        max_size: usize,
    },
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextError::InputTooLarge {
                input_size,
                max_size,
            } => {
                write!(
                    f,
                    "Input too large: {} bytes exceeds limit of {} bytes",
                    input_size, max_size
                )
            }
        }
    }
}

impl std::error::Error for ContextError {}

/// Failure of a whole-document parse
///
/// Returned by the one-shot helpers that create a context and parse in one go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The context could not be created
    Context(ContextError),
    /// The document did not match the root parser
    Parse(ParseError),
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::Context(e) => write!(f, "{}", e),
            DocumentError::Parse(e) => {
                write!(f, "Parse failed at position {}: {}", e.position, e.message)
            }
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DocumentError::Context(e) => Some(e),
            DocumentError::Parse(e) => Some(e),
        }
    }
}

impl From<ContextError> for DocumentError {
    fn from(e: ContextError) -> Self {
        DocumentError::Context(e)
    }
}

impl From<ParseError> for DocumentError {
    fn from(e: ParseError) -> Self {
        DocumentError::Parse(e)
    }
}
