//! R tokenizer — converts R source text into a stream of nodes
//!
//! Handles: symbols (plain and backquoted), keywords, numeric constants
//! (decimal, hex, `L`/`i` suffixes), quoted and raw strings, `%op%`
//! operators, comments and line breaks.
//!
//! Unlike a compiler front end, comments and newlines are kept as tokens:
//! the formatter needs them to reproduce the source layout.
//!
//! Guarantees:
//! - Deterministic: same input always produces same token stream
//! - Lossless for token text: every node's `value` is its exact source slice
//!   (comments excepted, which lose trailing whitespace)

use serde::{Deserialize, Serialize};

use super::ast::{Node, TokenType};
use crate::{Error, Result};

/// Position in source text for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Tokenizer for R source text
pub struct Tokenizer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Tokenizer {
    /// Create a new tokenizer for the given input text
    pub fn new(text: &str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        Tokenizer {
            input: text.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire input; the last node is always `Eof`
    pub fn tokenize(&mut self) -> Result<Vec<Node>> {
        let mut tokens = Vec::new();

        loop {
            self.skip_blanks();

            if self.is_at_end() {
                tokens.push(Node::new(TokenType::Eof, "", self.current_span()));
                break;
            }

            let token = self.next_token()?;
            tokens.push(token);
        }

        Ok(tokens)
    }

    // ── Character helpers ──────────────────────────────────

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.input.get(self.position).copied();
        if let Some(c) = ch {
            self.position += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        ch
    }

    fn current_span(&self) -> Span {
        Span {
            line: self.line,
            column: self.column,
            offset: self.position,
        }
    }

    fn text_from(&self, start: usize) -> String {
        self.input[start..self.position].iter().collect()
    }

    // ── Whitespace ─────────────────────────────────────────

    fn skip_blanks(&mut self) {
        while let Some(ch) = self.peek() {
            if ch != '\n' && ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    // ── Main dispatch ──────────────────────────────────────

    fn next_token(&mut self) -> Result<Node> {
        let span = self.current_span();
        let Some(ch) = self.peek() else {
            return Ok(Node::new(TokenType::Eof, "", span));
        };
        let next = self.peek_ahead(1);
        let after = self.peek_ahead(2);

        match ch {
            '\n' => Ok(self.read_newlines(span)),
            '#' => Ok(self.read_comment(span)),
            '"' | '\'' => self.read_string(span),
            '`' => self.read_backquoted(span),
            '%' => self.read_special(span),
            'r' | 'R' if matches!(next, Some('"') | Some('\'')) => self.read_raw_string(span),
            c if c.is_ascii_digit() => self.read_number(span),
            '.' if next.is_some_and(|c| c.is_ascii_digit()) => self.read_number(span),
            c if c.is_alphabetic() || c == '.' => Ok(self.read_identifier_or_keyword(span)),
            // pipe placeholder
            '_' if !next.is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.') => {
                Ok(self.op(span, 1, TokenType::Symbol))
            }

            '(' => Ok(self.op(span, 1, TokenType::LParen)),
            ')' => Ok(self.op(span, 1, TokenType::RParen)),
            '{' => Ok(self.op(span, 1, TokenType::LBrace)),
            '}' => Ok(self.op(span, 1, TokenType::RBrace)),
            '[' if next == Some('[') => Ok(self.op(span, 2, TokenType::LBB)),
            '[' => Ok(self.op(span, 1, TokenType::LBracket)),
            ']' => Ok(self.op(span, 1, TokenType::RBracket)),
            ',' => Ok(self.op(span, 1, TokenType::Comma)),
            ';' => Ok(self.op(span, 1, TokenType::Semicolon)),

            '<' if next == Some('<') && after == Some('-') => {
                Ok(self.op(span, 3, TokenType::LeftAssign))
            }
            '<' if next == Some('-') => Ok(self.op(span, 2, TokenType::LeftAssign)),
            '<' if next == Some('=') => Ok(self.op(span, 2, TokenType::Le)),
            '<' => Ok(self.op(span, 1, TokenType::Lt)),
            '-' if next == Some('>') && after == Some('>') => {
                Ok(self.op(span, 3, TokenType::RightAssign))
            }
            '-' if next == Some('>') => Ok(self.op(span, 2, TokenType::RightAssign)),
            '-' => Ok(self.op(span, 1, TokenType::Minus)),
            '>' if next == Some('=') => Ok(self.op(span, 2, TokenType::Ge)),
            '>' => Ok(self.op(span, 1, TokenType::Gt)),
            '=' if next == Some('=') => Ok(self.op(span, 2, TokenType::Eq)),
            '=' => Ok(self.op(span, 1, TokenType::EqAssign)),
            '!' if next == Some('=') => Ok(self.op(span, 2, TokenType::Ne)),
            '!' => Ok(self.op(span, 1, TokenType::Not)),
            '&' if next == Some('&') => Ok(self.op(span, 2, TokenType::And2)),
            '&' => Ok(self.op(span, 1, TokenType::And)),
            '|' if next == Some('|') => Ok(self.op(span, 2, TokenType::Or2)),
            '|' if next == Some('>') => Ok(self.op(span, 2, TokenType::Pipe)),
            '|' => Ok(self.op(span, 1, TokenType::Or)),
            ':' if next == Some(':') && after == Some(':') => {
                Ok(self.op(span, 3, TokenType::NsGetInt))
            }
            ':' if next == Some(':') => Ok(self.op(span, 2, TokenType::NsGet)),
            ':' if next == Some('=') => Ok(self.op(span, 2, TokenType::LeftAssign)),
            ':' => Ok(self.op(span, 1, TokenType::Colon)),
            '*' if next == Some('*') => Ok(self.op(span, 2, TokenType::Caret)),
            '*' => Ok(self.op(span, 1, TokenType::Star)),
            '+' => Ok(self.op(span, 1, TokenType::Plus)),
            '/' => Ok(self.op(span, 1, TokenType::Slash)),
            '^' => Ok(self.op(span, 1, TokenType::Caret)),
            '~' => Ok(self.op(span, 1, TokenType::Tilde)),
            '?' => Ok(self.op(span, 1, TokenType::Question)),
            '$' => Ok(self.op(span, 1, TokenType::Dollar)),
            '@' => Ok(self.op(span, 1, TokenType::At)),
            '\\' => Ok(self.op(span, 1, TokenType::Lambda)),

            _ => Err(Error::ParseError(format!(
                "Unexpected character '{}' at {}",
                ch, span
            ))),
        }
    }

    /// Consume `len` characters as a single operator or bracket
    fn op(&mut self, span: Span, len: usize, token_type: TokenType) -> Node {
        let start = self.position;
        for _ in 0..len {
            self.advance();
        }
        Node::new(token_type, self.text_from(start), span)
    }

    // ── Newlines & comments ────────────────────────────────

    fn read_newlines(&mut self, span: Span) -> Node {
        let mut breaks = 0;
        while self.peek() == Some('\n') {
            self.advance();
            breaks += 1;
            self.skip_blanks();
        }
        Node::with_int(TokenType::Newline, "\n", breaks, span)
    }

    fn read_comment(&mut self, span: Span) -> Node {
        let start = self.position;
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
        let text = self.text_from(start);
        Node::new(TokenType::Comment, text.trim_end(), span)
    }

    // ── String literals ────────────────────────────────────

    fn read_string(&mut self, span: Span) -> Result<Node> {
        let start = self.position;
        let quote = self.advance();

        loop {
            match self.advance() {
                None => {
                    return Err(Error::ParseError(format!(
                        "Unterminated string starting at {}",
                        span
                    )));
                }
                Some('\\') => {
                    if self.advance().is_none() {
                        return Err(Error::ParseError(format!(
                            "Unterminated escape sequence at {}",
                            self.current_span()
                        )));
                    }
                }
                c if c == quote => break,
                Some(_) => {}
            }
        }

        Ok(Node::new(TokenType::StrConst, self.text_from(start), span))
    }

    /// `r"(...)"`, `R'[...]'`, `r"---{...}---"`
    fn read_raw_string(&mut self, span: Span) -> Result<Node> {
        let start = self.position;
        self.advance(); // r or R
        let quote = self.advance();

        let mut dashes = 0;
        while self.peek() == Some('-') {
            self.advance();
            dashes += 1;
        }

        let close = match self.advance() {
            Some('(') => ')',
            Some('[') => ']',
            Some('{') => '}',
            _ => {
                return Err(Error::ParseError(format!(
                    "Malformed raw string literal at {}",
                    span
                )));
            }
        };

        loop {
            match self.advance() {
                None => {
                    return Err(Error::ParseError(format!(
                        "Unterminated raw string starting at {}",
                        span
                    )));
                }
                Some(c) if c == close => {
                    let fence_ok = (0..dashes).all(|i| self.peek_ahead(i) == Some('-'));
                    if fence_ok && self.peek_ahead(dashes) == quote {
                        for _ in 0..=dashes {
                            self.advance();
                        }
                        break;
                    }
                }
                Some(_) => {}
            }
        }

        Ok(Node::new(TokenType::StrConst, self.text_from(start), span))
    }

    fn read_backquoted(&mut self, span: Span) -> Result<Node> {
        let start = self.position;
        self.advance(); // opening `

        loop {
            match self.advance() {
                None => {
                    return Err(Error::ParseError(format!(
                        "Unterminated backquoted name starting at {}",
                        span
                    )));
                }
                Some('\\') => {
                    self.advance();
                }
                Some('`') => break,
                Some(_) => {}
            }
        }

        Ok(Node::new(TokenType::Symbol, self.text_from(start), span))
    }

    fn read_special(&mut self, span: Span) -> Result<Node> {
        let start = self.position;
        self.advance(); // opening %

        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(Error::ParseError(format!(
                        "Unterminated operator starting at {}",
                        span
                    )));
                }
                Some('%') => {
                    self.advance();
                    break;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }

        Ok(Node::new(TokenType::Special, self.text_from(start), span))
    }

    // ── Numbers ────────────────────────────────────────────

    fn read_number(&mut self, span: Span) -> Result<Node> {
        let start = self.position;

        if self.peek() == Some('0') && matches!(self.peek_ahead(1), Some('x') | Some('X')) {
            self.advance();
            self.advance();
            let digits_start = self.position;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.advance();
            }
            let digits = self.text_from(digits_start);

            let mut fraction = String::new();
            if self.peek() == Some('.') {
                self.advance();
                let fraction_start = self.position;
                while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                    self.advance();
                }
                fraction = self.text_from(fraction_start);
            }
            if digits.is_empty() && fraction.is_empty() {
                return Err(Error::ParseError(format!(
                    "Malformed hexadecimal constant at {}",
                    span
                )));
            }

            let mut exponent = None;
            if matches!(self.peek(), Some('p') | Some('P')) {
                self.advance();
                let exponent_start = self.position;
                if matches!(self.peek(), Some('+') | Some('-')) {
                    self.advance();
                }
                if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    return Err(Error::ParseError(format!(
                        "Malformed exponent in number at {}",
                        span
                    )));
                }
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
                exponent = Some(self.text_from(exponent_start));
            }

            let int_value = if fraction.is_empty() && exponent.is_none() {
                i64::from_str_radix(&digits, 16).unwrap_or(0)
            } else {
                hex_float_value(&digits, &fraction, exponent.as_deref())
            };
            let imaginary = self.read_number_suffix();
            let int_value = if imaginary { 0 } else { int_value };
            return Ok(Node::with_int(
                TokenType::NumConst,
                self.text_from(start),
                int_value,
                span,
            ));
        }

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance();
            }
            if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                return Err(Error::ParseError(format!(
                    "Malformed exponent in number at {}",
                    span
                )));
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let mantissa = self.text_from(start);
        let imaginary = self.read_number_suffix();
        let int_value = if imaginary {
            0
        } else {
            integral_value(&mantissa)
        };

        Ok(Node::with_int(
            TokenType::NumConst,
            self.text_from(start),
            int_value,
            span,
        ))
    }

    /// Consumes an `L` or `i` suffix; returns true for imaginary constants
    fn read_number_suffix(&mut self) -> bool {
        match self.peek() {
            Some('L') => {
                self.advance();
                false
            }
            Some('i') => {
                self.advance();
                true
            }
            _ => false,
        }
    }

    // ── Identifiers & Keywords ─────────────────────────────

    fn read_identifier_or_keyword(&mut self, span: Span) -> Node {
        let start = self.position;

        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '.' || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text = self.text_from(start);

        let (token_type, int_value) = match text.as_str() {
            "function" => (TokenType::Function, 0),
            "if" => (TokenType::If, 0),
            "else" => (TokenType::Else, 0),
            "for" => (TokenType::For, 0),
            "in" => (TokenType::In, 0),
            "while" => (TokenType::While, 0),
            "repeat" => (TokenType::Repeat, 0),
            "break" => (TokenType::Break, 0),
            "next" => (TokenType::Next, 0),

            "TRUE" => (TokenType::NumConst, 1),
            "FALSE" | "NA" | "NA_integer_" | "NA_real_" | "NA_character_" | "Inf" | "NaN" => {
                (TokenType::NumConst, 0)
            }
            "NULL" => (TokenType::NullConst, 0),

            _ => (TokenType::Symbol, 0),
        };

        Node::with_int(token_type, text, int_value, span)
    }
}

/// Integral value of a decimal literal, or 0 when it has a fractional part
/// or does not fit exactly in an `i64`.
fn integral_value(text: &str) -> i64 {
    if !text.contains(['.', 'e', 'E']) {
        return text.parse().unwrap_or(0);
    }
    text.parse::<f64>().map_or(0, whole_number)
}

/// Value of `0x<digits>.<fraction>p<exponent>` under the same rule
fn hex_float_value(digits: &str, fraction: &str, exponent: Option<&str>) -> i64 {
    let mut value = 0.0_f64;
    for c in digits.chars() {
        value = value * 16.0 + f64::from(c.to_digit(16).unwrap_or(0));
    }
    let mut scale = 1.0 / 16.0;
    for c in fraction.chars() {
        value += f64::from(c.to_digit(16).unwrap_or(0)) * scale;
        scale /= 16.0;
    }
    let exponent: i32 = exponent.and_then(|e| e.parse().ok()).unwrap_or(0);
    whole_number(value * 2.0_f64.powi(exponent))
}

fn whole_number(v: f64) -> i64 {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 9_007_199_254_740_992.0 {
        v as i64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &str) -> Vec<TokenType> {
        Tokenizer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|n| n.token_type)
            .collect()
    }

    fn values(input: &str) -> Vec<String> {
        Tokenizer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|n| n.value)
            .collect()
    }

    fn tokenize_err(input: &str) -> String {
        Tokenizer::new(input).tokenize().unwrap_err().to_string()
    }

    // ── Assignment & operators ─────────────────────────

    #[test]
    fn test_tokenize_assignments() {
        let tokens = tokenize("x <- 1; y <<- 2; 3 -> z; 4 ->> w; v = 5");
        use TokenType::*;
        assert_eq!(
            tokens,
            vec![
                Symbol, LeftAssign, NumConst, Semicolon, Symbol, LeftAssign, NumConst, Semicolon,
                NumConst, RightAssign, Symbol, Semicolon, NumConst, RightAssign, Symbol,
                Semicolon, Symbol, EqAssign, NumConst, Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_operators_longest_match() {
        use TokenType::*;
        let tokens = tokenize("a <= b >= c == d != e && f || g |> h ::: i :: j := k ** l");
        assert_eq!(
            tokens,
            vec![
                Symbol, Le, Symbol, Ge, Symbol, Eq, Symbol, Ne, Symbol, And2, Symbol, Or2,
                Symbol, Pipe, Symbol, NsGetInt, Symbol, NsGet, Symbol, LeftAssign, Symbol,
                Caret, Symbol, Eof,
            ]
        );
    }

    #[test]
    fn test_less_than_negative_is_assignment() {
        // R itself reads `x<-1` as assignment
        assert_eq!(values("x<-1"), vec!["x", "<-", "1", ""]);
    }

    #[test]
    fn test_tokenize_special_operators() {
        let tokens = Tokenizer::new("x %in% y %>% f").tokenize().unwrap();
        assert_eq!(tokens[1].token_type, TokenType::Special);
        assert_eq!(tokens[1].value, "%in%");
        assert_eq!(tokens[3].value, "%>%");
    }

    #[test]
    fn test_unterminated_special() {
        let err = tokenize_err("x %in\n y");
        assert!(err.contains("Unterminated operator"));
    }

    #[test]
    fn test_brackets_and_double_bracket() {
        use TokenType::*;
        assert_eq!(
            tokenize("x[[1]][2]"),
            vec![Symbol, LBB, NumConst, RBracket, RBracket, LBracket, NumConst, RBracket, Eof]
        );
    }

    // ── Keywords & constants ───────────────────────────

    #[test]
    fn test_tokenize_keywords() {
        use TokenType::*;
        let tokens = tokenize("function if else for in while repeat break next");
        assert_eq!(
            tokens,
            vec![Function, If, Else, For, In, While, Repeat, Break, Next, Eof]
        );
    }

    #[test]
    fn test_tokenize_constants() {
        let tokens = Tokenizer::new("TRUE FALSE NULL NA_integer_ Inf").tokenize().unwrap();
        assert_eq!(tokens[0].token_type, TokenType::NumConst);
        assert_eq!(tokens[0].int_value, 1);
        assert_eq!(tokens[1].int_value, 0);
        assert_eq!(tokens[2].token_type, TokenType::NullConst);
        assert_eq!(tokens[3].token_type, TokenType::NumConst);
        assert_eq!(tokens[4].value, "Inf");
    }

    #[test]
    fn test_tokenize_lambda() {
        use TokenType::*;
        assert_eq!(
            tokenize(r"\(x) x + 1"),
            vec![Lambda, LParen, Symbol, RParen, Symbol, Plus, NumConst, Eof]
        );
    }

    // ── Identifiers ────────────────────────────────────

    #[test]
    fn test_tokenize_dotted_identifiers() {
        assert_eq!(
            values(".hidden my.var snake_case ... ..1"),
            vec![".hidden", "my.var", "snake_case", "...", "..1", ""]
        );
    }

    #[test]
    fn test_tokenize_backquoted_symbol() {
        let tokens = Tokenizer::new("`my var` <- 1").tokenize().unwrap();
        assert_eq!(tokens[0].token_type, TokenType::Symbol);
        assert_eq!(tokens[0].value, "`my var`");
    }

    #[test]
    fn test_unterminated_backquote() {
        assert!(tokenize_err("`abc").contains("Unterminated backquoted name"));
    }

    // ── Numbers ────────────────────────────────────────

    #[test]
    fn test_tokenize_numbers() {
        let tokens = Tokenizer::new("42 3.14 .5 1e3 2.5e-2 0x1F 7L 2i").tokenize().unwrap();
        let ints: Vec<i64> = tokens.iter().map(|n| n.int_value).collect();
        assert_eq!(ints, vec![42, 0, 0, 1000, 0, 31, 7, 0, 0]);
        assert!(tokens[..8].iter().all(|n| n.token_type == TokenType::NumConst));
        assert_eq!(tokens[6].value, "7L");
        assert_eq!(tokens[7].value, "2i");
    }

    #[test]
    fn test_hex_float_is_one_token() {
        let tokens = Tokenizer::new("0x1.8p3 0xAp-1L 0x.8P+1 0x1.8").tokenize().unwrap();
        let values: Vec<&str> = tokens.iter().map(|n| n.value.as_str()).collect();
        assert_eq!(values, vec!["0x1.8p3", "0xAp-1L", "0x.8P+1", "0x1.8", ""]);
        let ints: Vec<i64> = tokens.iter().map(|n| n.int_value).collect();
        assert_eq!(ints, vec![12, 5, 1, 0, 0]);
        assert!(tokenize_err("0x1p").contains("Malformed exponent"));
    }

    #[test]
    fn test_malformed_exponent() {
        assert!(tokenize_err("1e+").contains("Malformed exponent"));
    }

    #[test]
    fn test_malformed_hex() {
        assert!(tokenize_err("0x").contains("Malformed hexadecimal"));
    }

    // ── Strings ────────────────────────────────────────

    #[test]
    fn test_strings_keep_source_text() {
        assert_eq!(
            values(r#""a\"b" 'it''s'"#),
            vec![r#""a\"b""#, "'it'", "'s'", ""]
        );
    }

    #[test]
    fn test_multiline_string() {
        let tokens = Tokenizer::new("x <- \"line1\nline2\"\ny").tokenize().unwrap();
        assert_eq!(tokens[2].value, "\"line1\nline2\"");
        assert_eq!(tokens[3].token_type, TokenType::Newline);
        assert_eq!(tokens[4].span.line, 3);
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize_err("\"hello");
        assert!(err.contains("Unterminated string"));
        assert!(err.contains("1:1"));
    }

    #[test]
    fn test_raw_strings() {
        let tokens = Tokenizer::new(r#"r"(C:\path)" R"-[a ]" b]-" r'{x}'"#)
            .tokenize()
            .unwrap();
        assert_eq!(tokens[0].value, r#"r"(C:\path)""#);
        assert_eq!(tokens[1].value, r#"R"-[a ]" b]-""#);
        assert_eq!(tokens[2].value, "r'{x}'");
        assert!(tokens[..3].iter().all(|n| n.token_type == TokenType::StrConst));
    }

    #[test]
    fn test_unterminated_raw_string() {
        assert!(tokenize_err(r#"r"(abc"#).contains("Unterminated raw string"));
        assert!(tokenize_err(r#"r"abc""#).contains("Malformed raw string"));
    }

    #[test]
    fn test_r_symbol_is_not_raw_string() {
        assert_eq!(values("r + R"), vec!["r", "+", "R", ""]);
    }

    // ── Trivia ─────────────────────────────────────────

    #[test]
    fn test_newlines_merge_and_count() {
        let tokens = Tokenizer::new("a\n\n  \n b\r\nc").tokenize().unwrap();
        assert_eq!(tokens[1].token_type, TokenType::Newline);
        assert_eq!(tokens[1].int_value, 3);
        assert_eq!(tokens[3].token_type, TokenType::Newline);
        assert_eq!(tokens[3].int_value, 1);
        assert_eq!(tokens[4].value, "c");
    }

    #[test]
    fn test_comments_trim_trailing_whitespace() {
        let tokens = Tokenizer::new("x # note   \n#' @export\t\n").tokenize().unwrap();
        assert_eq!(tokens[1].token_type, TokenType::Comment);
        assert_eq!(tokens[1].value, "# note");
        assert_eq!(tokens[3].value, "#' @export");
    }

    // ── Span tracking ──────────────────────────────────

    #[test]
    fn test_span_tracking() {
        let tokens = Tokenizer::new("f <- function(x) {\n  x\n}").tokenize().unwrap();
        assert_eq!(tokens[0].span, Span { line: 1, column: 1, offset: 0 });
        assert_eq!(tokens[1].span, Span { line: 1, column: 3, offset: 2 });
        assert_eq!(tokens[6].span, Span { line: 1, column: 18, offset: 17 });
        assert_eq!(tokens[8].span, Span { line: 2, column: 3, offset: 21 });
        assert_eq!(tokens[10].span, Span { line: 3, column: 1, offset: 23 });
    }

    // ── Edge cases ─────────────────────────────────────

    #[test]
    fn test_empty_input() {
        assert_eq!(tokenize(""), vec![TokenType::Eof]);
    }

    #[test]
    fn test_only_blanks() {
        assert_eq!(tokenize("  \t "), vec![TokenType::Eof]);
    }

    #[test]
    fn test_pipe_placeholder() {
        assert_eq!(
            tokenize("x |> f(y = _)"),
            vec![
                TokenType::Symbol,
                TokenType::Pipe,
                TokenType::Symbol,
                TokenType::LParen,
                TokenType::Symbol,
                TokenType::EqAssign,
                TokenType::Symbol,
                TokenType::RParen,
                TokenType::Eof,
            ]
        );
        assert!(tokenize_err("_x").contains("Unexpected character '_'"));
    }

    #[test]
    fn test_leading_byte_order_mark_skipped() {
        let tokens = Tokenizer::new("\u{feff}x <- 1").tokenize().unwrap();
        assert_eq!(tokens[0].value, "x");
        assert_eq!(tokens[0].span.column, 1);
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize_err("x <- 1 ¬ 2");
        assert!(err.contains("Unexpected character"));
        assert!(err.contains("1:8"));
    }

    #[test]
    fn test_tokenize_determinism_100_iterations() {
        let input = "f <- function(x, y = 2L) {\n  x %>% g(y = y) # pipe\n}\n";
        let first = Tokenizer::new(input).tokenize().unwrap();

        for i in 0..100 {
            let result = Tokenizer::new(input).tokenize().unwrap();
            assert_eq!(first, result, "Determinism failure at iteration {}", i);
        }
    }
}
