//! Error types for rfmt
//!
//! All fallible operations return `Result<T, Error>`.
//! Parse errors carry `line:column` in their message.

use thiserror::Error;

/// rfmt error types
#[derive(Debug, Error)]
pub enum Error {
    /// Lexical or bracket-structure violation in R source
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The formatter could not produce output equivalent to its input
    #[error("Format error: {0}")]
    FormatError(String),

    /// Invalid or unreadable configuration
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Reading or writing source files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for rfmt operations
pub type Result<T> = std::result::Result<T, Error>;
