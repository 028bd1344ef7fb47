//! Error types for the REPL session
//!
//! This module defines [`ReplError`], which represents everything that can go
//! wrong between reading a line and reporting the result of its evaluation.
//!
//! Only two failures end the session: exceeding the hard text-buffer ceiling
//! and failing to spawn a subprocess.  A rejected translation unit keeps the
//! line and the session alive, and type-inference misses are plain stderr
//! diagnostics that never surface as an error value at all.

use std::fmt;

/// Errors that can occur while maintaining or evaluating the program text
#[derive(Debug)]
pub enum ReplError {
    /// A text buffer would grow past the hard size ceiling
    BufferOverflow { requested: usize, max: usize },

    /// The toolchain or the compiled program could not be spawned
    SpawnFailed { program: String, reason: String },

    /// The toolchain rejected the current program text
    CompileFailed { status: i32 },

    /// Underlying I/O failure (output file, seed file, child pipe)
    Io(std::io::Error),

    /// Line editor failure other than interrupt or end-of-input
    Readline(rustyline::error::ReadlineError),
}

impl ReplError {
    /// Session-fatal errors abort the REPL after cleanup has run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ReplError::BufferOverflow { .. } | ReplError::SpawnFailed { .. }
        )
    }
}

impl fmt::Display for ReplError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplError::BufferOverflow { requested, max } => {
                write!(
                    f,
                    "program text too large: {} bytes requested, ceiling is {}",
                    requested, max
                )
            }
            ReplError::SpawnFailed { program, reason } => {
                write!(f, "failed to execute '{}': {}", program, reason)
            }
            ReplError::CompileFailed { status } => {
                write!(f, "compilation failed with status {}", status)
            }
            ReplError::Io(e) => write!(f, "I/O error: {}", e),
            ReplError::Readline(e) => write!(f, "line editor error: {}", e),
        }
    }
}

impl std::error::Error for ReplError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReplError::Io(e) => Some(e),
            ReplError::Readline(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ReplError {
    fn from(e: std::io::Error) -> Self {
        ReplError::Io(e)
    }
}

impl From<rustyline::error::ReadlineError> for ReplError {
    fn from(e: rustyline::error::ReadlineError) -> Self {
        ReplError::Readline(e)
    }
}
