//! rfmt Core - R source tokenizer, parser and formatter
//!
//! All front ends (the `rfmt` CLI and the C ABI) call into this crate;
//! none of them carry formatting logic of their own.
//!
//! # Architecture
//!
//! ```text
//! R Text → Tokenizer → Nodes → Parser → SourceFile (tokens, functions, packages)
//!                                          ↓
//!                                       Formatter → Formatted Text
//!                                          ↓
//!                                       Fingerprint check (SHA-256 of tokens)
//! ```
//!
//! # Guarantees
//!
//! - **Deterministic**: Same input and config always produce identical output
//! - **Idempotent**: Formatting formatted code changes nothing
//! - **Token preserving**: Only whitespace and line indentation ever change

pub mod config;
pub mod error;
pub mod formatter;
pub mod list;
pub mod parser;

pub use config::FormatConfig;
pub use error::{Error, Result};
pub use formatter::{check_source, fingerprint, format_file, format_source};
pub use list::List;
pub use parser::ast::*;
pub use parser::parse;
pub use parser::tokenizer::Span;
