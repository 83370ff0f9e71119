//! Error types for metric sampling.
//!
//! None of these escape a sampling pass: the sampler logs them and leaves the
//! affected metric out of the snapshot.

use std::time::Duration;

/// A diagnostic command did not produce usable output.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}")]
    ExitStatus { command: String, status: String },

    /// Anything written to stderr counts as failure, even with a zero exit.
    #[error("`{command}` wrote to stderr: {stderr}")]
    Stderr { command: String, stderr: String },

    #[error("`{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },
}

/// Command output was present but not in the expected shape.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The output had fewer lines than the fixed-position parser needs.
    #[error("missing line {line} ({field})")]
    MissingLine { line: usize, field: &'static str },

    #[error("no integer on line {line} ({field})")]
    MissingNumber { line: usize, field: &'static str },

    #[error("expected {expected} percentage tokens, found {found}")]
    PercentageCount { expected: usize, found: usize },

    #[error("invalid number `{0}`")]
    InvalidNumber(String),

    /// A counter, or a sum of counters, does not fit in 64 bits.
    #[error("{field} overflows a 64-bit counter")]
    Overflow { field: &'static str },

    #[error("total memory is zero")]
    ZeroTotal,

    #[error("no connection lines in output")]
    NoConnections,
}

#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}
