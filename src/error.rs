//! Error taxonomy for the Jack compiler.
//!
//! Mirrors the hand-rolled enum + manual `Display`/`Error` style used
//! throughout this codebase rather than pulling in an error-derive crate:
//! there is one failure path per class (the compiler is fatal on the first
//! error) so there's little to gain from more machinery.

use std::fmt;
use std::path::PathBuf;

/// A source position, 0-indexed to match the rest of the toolchain's
/// line/column conventions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(file: PathBuf, line: usize, column: usize) -> Self {
        SourceLocation { file, line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line + 1)
    }
}

/// All ways compilation of a single class can fail.
///
/// Every variant is fatal: the compiler does not attempt recovery, it
/// surfaces one diagnostic line and aborts that file (spec §7).
#[derive(Debug)]
pub enum JackError {
    /// Unrecognized character or unterminated string literal.
    Lexical {
        loc: SourceLocation,
        message: String,
    },
    /// Grammar mismatch: carries the expected set and the actual lexeme.
    UnexpectedToken {
        loc: SourceLocation,
        expected: String,
        actual: String,
    },
    /// An identifier used as a value was not found in either scope.
    UndefinedSymbol {
        loc: SourceLocation,
        name: String,
    },
    /// A name was declared twice in the same symbol-table scope.
    DuplicateSymbol {
        loc: SourceLocation,
        name: String,
    },
    /// A compiler-internal invariant was violated (e.g. an unpatched
    /// function-header placeholder). Should never happen on valid input;
    /// exists so the patch step can fail loudly instead of emitting
    /// malformed VM text.
    InternalAssertion(String),
}

impl fmt::Display for JackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JackError::Lexical { loc, message } => {
                write!(f, "{loc}: lexical error: {message}")
            }
            JackError::UnexpectedToken {
                loc,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "{loc}: unexpected token: expected {expected}, got '{actual}'"
                )
            }
            JackError::UndefinedSymbol { loc, name } => {
                write!(f, "{loc}: undefined symbol '{name}'")
            }
            JackError::DuplicateSymbol { loc, name } => {
                write!(f, "{loc}: '{name}' is already declared in this scope")
            }
            JackError::InternalAssertion(message) => {
                write!(f, "internal compiler error: {message}")
            }
        }
    }
}

impl std::error::Error for JackError {}

pub type JackResult<T> = Result<T, JackError>;
