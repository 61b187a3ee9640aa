//! R source formatter: re-emits tokens with canonical spacing and indentation
//!
//! The formatter walks the classified token list once, deciding for every
//! token whether a space precedes it and, at the start of each line, how far
//! the line is indented. Line breaks come from the source: the formatter
//! never joins or splits statements, except for wrapping over-long argument
//! lists at their commas.
//!
//! # Pipeline
//!
//! `R text → parse → layout → wrap → render → fingerprint check`
//!
//! # Guarantees
//!
//! - **Idempotent**: `format(format(x)) == format(x)`
//! - **Deterministic**: same input always produces same output
//! - **Token preserving**: the SHA-256 token fingerprint of the output equals
//!   that of the input, otherwise formatting fails and the input is untouched

use std::collections::BTreeMap;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::config::FormatConfig;
use crate::parser::ast::{Node, TokenType};
use crate::parser::tokenizer::Tokenizer;
use crate::{Error, Result};

// ── Public API ─────────────────────────────────────────────

/// Format R source text
///
/// # Errors
/// Returns `ParseError` for invalid input, `ConfigError` for an invalid
/// configuration, or `FormatError` if the output would not contain exactly
/// the input's tokens.
pub fn format_source(text: &str, config: &FormatConfig) -> Result<String> {
    config.validate()?;
    let source = crate::parser::parse(text)?;

    let mut formatter = Formatter::new(config);
    for node in &source.tokens {
        formatter.push(node);
    }
    let mut lines = formatter.finish();

    if config.wrap_long_lines {
        lines = lines
            .into_iter()
            .flat_map(|line| wrap_line(line, config.line_width))
            .collect();
    }

    let formatted = render(&lines);

    let before = fingerprint(text)?;
    let after = fingerprint(&formatted)?;
    if before != after {
        warn!(%before, %after, "formatting changed the token stream");
        return Err(Error::FormatError(
            "formatting would change the token stream; input left untouched".to_string(),
        ));
    }

    debug!(lines = lines.len(), "formatted R source");
    Ok(formatted)
}

/// Read and format a file (the file itself is not modified)
pub fn format_file(path: &Path, config: &FormatConfig) -> Result<String> {
    let text = std::fs::read_to_string(path)?;
    format_source(&text, config)
}

/// Whether `text` is already formatted
pub fn check_source(text: &str, config: &FormatConfig) -> Result<bool> {
    Ok(format_source(text, config)? == text)
}

/// SHA-256 over the kind and text of every token except line breaks
///
/// Two sources with the same fingerprint differ only in layout.
pub fn fingerprint(text: &str) -> Result<String> {
    let tokens = Tokenizer::new(text).tokenize()?;
    let mut hasher = Sha256::new();
    for node in tokens
        .iter()
        .filter(|n| !matches!(n.token_type, TokenType::Newline | TokenType::Eof))
    {
        hasher.update(format!("{:?}", node.token_type).as_bytes());
        hasher.update([0x1f]);
        hasher.update(node.value.as_bytes());
        hasher.update([0x1e]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Render a balanced token slice on a single line, e.g. a default value
pub(crate) fn render_inline(tokens: &[Node]) -> String {
    let config = FormatConfig {
        wrap_long_lines: false,
        ..FormatConfig::default()
    };
    let mut formatter = Formatter::new(&config);
    for node in tokens.iter().filter(|n| !n.token_type.is_trivia()) {
        formatter.token(node);
    }
    let mut out = String::new();
    for line in formatter.finish() {
        line.render_pieces(&mut out);
    }
    out
}

// ── Lines ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Piece {
    text: String,
    token_type: TokenType,
    space_before: bool,
}

#[derive(Debug, Clone, Default)]
struct Line {
    indent: usize,
    pieces: Vec<Piece>,
}

impl Line {
    fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Column just after piece `upto`; multi-line strings restart the count
    fn column_after(&self, upto: usize) -> usize {
        let mut column = self.indent;
        for piece in &self.pieces[..=upto] {
            if piece.space_before {
                column += 1;
            }
            match piece.text.rfind('\n') {
                Some(pos) => column = piece.text[pos + 1..].chars().count(),
                None => column += piece.text.chars().count(),
            }
        }
        column
    }

    fn width(&self) -> usize {
        match self.pieces.len() {
            0 => 0,
            n => self.column_after(n - 1),
        }
    }

    fn render_pieces(&self, out: &mut String) {
        for piece in &self.pieces {
            if piece.space_before {
                out.push(' ');
            }
            out.push_str(&piece.text);
        }
    }

    fn render(&self, out: &mut String) {
        if !self.is_empty() {
            write_indent(out, self.indent);
            self.render_pieces(out);
        }
        out.push('\n');
    }
}

fn write_indent(out: &mut String, n: usize) {
    for _ in 0..n {
        out.push(' ');
    }
}

fn render(lines: &[Line]) -> String {
    let mut out = String::new();
    for line in lines {
        line.render(&mut out);
    }
    out
}

// ── Layout ─────────────────────────────────────────────────

/// An open bracket awaiting its closer
#[derive(Debug, Clone)]
struct Open {
    token_type: TokenType,
    /// Index of the output line holding the opener
    line: usize,
    /// Indent a line starting with the closer gets
    base: usize,
    /// Column just after the opener
    column: usize,
    /// Something other than a comment follows the opener on its line
    has_content: bool,
    /// `(` of an `if`/`for`/`while`/`function` header
    header: bool,
}

impl Open {
    fn child_indent(&self, width: usize) -> usize {
        if self.token_type == TokenType::LBrace || !self.has_content {
            self.base + width
        } else {
            self.column
        }
    }
}

/// The last non-trivia token emitted
#[derive(Debug, Clone, Copy)]
struct Sig {
    token_type: TokenType,
    unary: bool,
    header_close: bool,
}

impl Sig {
    /// A line ending here continues on the next one
    fn expects_continuation(&self) -> bool {
        (self.token_type.is_binary_operator() && !self.unary)
            || self.header_close
            || self.token_type == TokenType::Else
    }
}

struct Formatter<'a> {
    config: &'a FormatConfig,
    lines: Vec<Line>,
    current: Line,
    stack: Vec<Open>,
    prev: Option<Sig>,
    newline_since_prev: bool,
    pending_blank: usize,
    continuation: bool,
}

impl<'a> Formatter<'a> {
    fn new(config: &'a FormatConfig) -> Self {
        Formatter {
            config,
            lines: Vec::new(),
            current: Line::default(),
            stack: Vec::new(),
            prev: None,
            newline_since_prev: false,
            pending_blank: 0,
            continuation: false,
        }
    }

    fn push(&mut self, node: &Node) {
        match node.token_type {
            TokenType::Newline => self.newline(node.int_value),
            TokenType::Eof => {}
            _ => self.token(node),
        }
    }

    fn finish(mut self) -> Vec<Line> {
        if !self.current.is_empty() {
            self.lines.push(self.current);
        }
        self.lines
    }

    fn in_block(&self) -> bool {
        self.stack
            .last()
            .map_or(true, |open| open.token_type == TokenType::LBrace)
    }

    fn context_indent(&self) -> usize {
        self.stack
            .last()
            .map_or(0, |open| open.child_indent(self.config.indent_width))
    }

    fn newline(&mut self, breaks: i64) {
        // a trailing comment does not count as content after the opener
        let ended_with_opener = self
            .current
            .pieces
            .iter()
            .rev()
            .find(|p| p.token_type != TokenType::Comment)
            .is_some_and(|p| p.token_type.is_opener());
        if !self.current.is_empty() {
            let line = std::mem::take(&mut self.current);
            self.lines.push(line);
        }

        self.newline_since_prev = true;
        self.continuation =
            self.in_block() && self.prev.is_some_and(|p| p.expects_continuation());

        let blanks = (breaks.max(1) as usize - 1).min(self.config.max_blank_lines);
        self.pending_blank = if self.lines.is_empty() || ended_with_opener {
            0
        } else {
            blanks
        };
    }

    fn token(&mut self, node: &Node) {
        let tt = node.token_type;
        let unary = tt.can_be_unary() && (tt == TokenType::Not || self.unary_position());

        let closed = if tt.is_closer() { self.stack.pop() } else { None };

        let space_before = if self.current.is_empty() {
            self.start_line(closed.as_ref());
            false
        } else {
            tt == TokenType::Comment || self.prev.is_some_and(|p| needs_space(p, tt))
        };

        self.current.pieces.push(Piece {
            text: node.value.clone(),
            token_type: tt,
            space_before,
        });

        if tt == TokenType::Comment {
            return;
        }

        let line_index = self.lines.len();
        if let Some(top) = self.stack.last_mut() {
            if top.line == line_index {
                top.has_content = true;
            }
        }

        if tt.is_opener() {
            let open = Open {
                token_type: tt,
                line: line_index,
                base: self.current.indent,
                column: self.current.width(),
                has_content: false,
                header: tt == TokenType::LParen
                    && self.prev.is_some_and(|p| {
                        matches!(
                            p.token_type,
                            TokenType::If
                                | TokenType::For
                                | TokenType::While
                                | TokenType::Function
                                | TokenType::Lambda
                        )
                    }),
            };
            if tt == TokenType::LBB {
                self.stack.push(open.clone());
            }
            self.stack.push(open);
        }

        self.prev = Some(Sig {
            token_type: tt,
            unary,
            header_close: closed.is_some_and(|open| open.header),
        });
        self.newline_since_prev = false;
    }

    fn start_line(&mut self, closed: Option<&Open>) {
        let indent = match closed {
            Some(open) => {
                self.pending_blank = 0;
                open.base
            }
            None if self.continuation => self.context_indent() + self.config.indent_width,
            None => self.context_indent(),
        };

        for _ in 0..self.pending_blank {
            self.lines.push(Line::default());
        }
        self.pending_blank = 0;
        self.continuation = false;
        self.current.indent = indent;
    }

    /// Whether an operator here is a prefix operator
    fn unary_position(&self) -> bool {
        let Some(prev) = self.prev else {
            return true;
        };
        if self.newline_since_prev && self.in_block() {
            return true;
        }
        let tt = prev.token_type;
        prev.unary
            || prev.header_close
            || tt.is_opener()
            || tt.is_binary_operator()
            || tt.is_tight_operator()
            || matches!(
                tt,
                TokenType::Comma
                    | TokenType::Semicolon
                    | TokenType::Not
                    | TokenType::Else
                    | TokenType::In
            )
    }
}

/// Whether a space separates `prev` from a following `cur` on the same line
fn needs_space(prev: Sig, cur: TokenType) -> bool {
    use TokenType::*;

    match cur {
        Comment => return true,
        Comma => return prev.token_type == Comma,
        Semicolon | RParen => return false,
        RBracket => return prev.token_type == Comma,
        RBrace => return prev.token_type != LBrace,
        _ => {}
    }
    if matches!(prev.token_type, LParen | LBracket | LBB) || prev.unary {
        return false;
    }
    if cur.is_tight_operator() || prev.token_type.is_tight_operator() {
        return false;
    }
    if prev.header_close {
        return true;
    }
    match cur {
        LParen => match prev.token_type {
            If | For | While => true,
            Function | Lambda => false,
            t if t.is_symbol_like() => false,
            StrConst | RParen | RBracket | RBrace => false,
            _ => true,
        },
        LBracket | LBB => match prev.token_type {
            t if t.is_symbol_like() => false,
            StrConst | RParen | RBracket => false,
            _ => true,
        },
        _ => true,
    }
}

// ── Wrapping ───────────────────────────────────────────────

/// Break an over-long line after the commas of its first argument list
///
/// Only a `(` group that closes on this line is split, and only when no
/// bracket opened after it is still open at the end of the line, so the
/// layout of the following lines does not depend on where the break fell.
fn wrap_line(line: Line, width: usize) -> Vec<Line> {
    if line.width() <= width || line.pieces.iter().any(|p| p.text.contains('\n')) {
        return vec![line];
    }
    let Some((open, commas)) = break_group(&line) else {
        return vec![line];
    };

    let align = line.column_after(open);
    let indent = line.indent;
    let mut bounds: Vec<usize> = commas.iter().map(|c| c + 1).collect();
    bounds.push(line.pieces.len());

    let mut pieces = line.pieces.into_iter();
    let mut taken = 0;
    let mut out = Vec::new();
    for end in bounds {
        let mut segment: Vec<Piece> = pieces.by_ref().take(end - taken).collect();
        taken = end;
        if segment.is_empty() {
            continue;
        }
        let segment_indent = if out.is_empty() {
            indent
        } else {
            segment[0].space_before = false;
            align
        };
        out.push(Line {
            indent: segment_indent,
            pieces: segment,
        });
    }

    out.into_iter()
        .flat_map(|segment| wrap_line(segment, width))
        .collect()
}

/// The first `(` closing on this line that has direct commas, with those commas
fn break_group(line: &Line) -> Option<(usize, Vec<usize>)> {
    let pieces = &line.pieces;
    let mut stack: Vec<usize> = Vec::new();
    let mut commas: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    let mut closed: Vec<usize> = Vec::new();

    for (i, piece) in pieces.iter().enumerate() {
        match piece.token_type {
            TokenType::LBB => {
                stack.push(i);
                stack.push(i);
            }
            t if t.is_opener() => stack.push(i),
            t if t.is_closer() => {
                if let Some(open) = stack.pop() {
                    if pieces[open].token_type == TokenType::LParen {
                        closed.push(open);
                    }
                }
            }
            TokenType::Comma => {
                if let Some(&open) = stack.last() {
                    commas.entry(open).or_default().push(i);
                }
            }
            _ => {}
        }
    }

    let last_unclosed = stack.iter().copied().max();

    closed.sort_unstable();
    closed
        .into_iter()
        .filter(|&open| last_unclosed.map_or(true, |last| last < open))
        .find_map(|open| commas.remove(&open).map(|c| (open, c)))
}
