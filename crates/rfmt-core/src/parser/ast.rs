//! rfmt data model — token kinds, nodes, and named fields
//!
//! A `Node` is one lexical token (or a rendered expression) carrying a type
//! tag, its exact source text, and an optional integer payload. A `Field`
//! binds a name to a node, e.g. a function formal and its default value.
//!
//! Token kinds follow the names R itself reports in `getParseData()`, so the
//! JSON emitted by `rfmt tokens --json` lines up with R tooling.

use serde::{Deserialize, Serialize};

use super::tokenizer::Span;
use crate::list::List;

/// Token kinds for R source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenType {
    // Symbols
    Symbol,
    SymbolFunctionCall,
    SymbolFormals,
    SymbolSub,
    SymbolPackage,

    // Constants
    NumConst,
    StrConst,
    NullConst,

    // Trivia
    Comment,
    Newline,

    // Keywords
    Function,
    Lambda,
    If,
    Else,
    For,
    In,
    While,
    Repeat,
    Break,
    Next,

    // Assignment
    LeftAssign,  // <- <<- :=
    RightAssign, // -> ->>
    EqAssign,    // = (statement level)
    EqSub,       // = (call argument)
    EqFormals,   // = (function formal default)

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Special, // %op%
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
    And,
    And2,
    Or,
    Or2,
    Not,
    Tilde,
    Question,
    Colon,
    NsGet,
    NsGetInt,
    Dollar,
    At,
    Pipe,

    // Brackets
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    #[serde(rename = "LBB")]
    LBB, // [[
    RBracket,

    // Separators
    Comma,
    Semicolon,

    // Structural tags
    Expr,
    Formals,
    Program,
    Packages,
    Eof,
}

impl TokenType {
    pub fn is_opener(self) -> bool {
        matches!(
            self,
            TokenType::LParen | TokenType::LBrace | TokenType::LBracket | TokenType::LBB
        )
    }

    pub fn is_closer(self) -> bool {
        matches!(
            self,
            TokenType::RParen | TokenType::RBrace | TokenType::RBracket
        )
    }

    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            TokenType::LeftAssign
                | TokenType::RightAssign
                | TokenType::EqAssign
                | TokenType::EqSub
                | TokenType::EqFormals
        )
    }

    /// Operators written with a space on both sides when used infix.
    ///
    /// `Minus`, `Plus`, `Tilde` and `Question` are listed here even though
    /// they may also appear in prefix position; the formatter decides which
    /// from the preceding token.
    pub fn is_binary_operator(self) -> bool {
        self.is_assignment()
            || matches!(
                self,
                TokenType::Plus
                    | TokenType::Minus
                    | TokenType::Star
                    | TokenType::Slash
                    | TokenType::Special
                    | TokenType::Gt
                    | TokenType::Ge
                    | TokenType::Lt
                    | TokenType::Le
                    | TokenType::Eq
                    | TokenType::Ne
                    | TokenType::And
                    | TokenType::And2
                    | TokenType::Or
                    | TokenType::Or2
                    | TokenType::Tilde
                    | TokenType::Question
                    | TokenType::Pipe
            )
    }

    /// Operators that may be used in prefix position.
    pub fn can_be_unary(self) -> bool {
        matches!(
            self,
            TokenType::Minus
                | TokenType::Plus
                | TokenType::Not
                | TokenType::Tilde
                | TokenType::Question
        )
    }

    /// Operators written without surrounding spaces: `^ : :: ::: $ @`
    pub fn is_tight_operator(self) -> bool {
        matches!(
            self,
            TokenType::Caret
                | TokenType::Colon
                | TokenType::NsGet
                | TokenType::NsGetInt
                | TokenType::Dollar
                | TokenType::At
        )
    }

    pub fn is_symbol_like(self) -> bool {
        matches!(
            self,
            TokenType::Symbol
                | TokenType::SymbolFunctionCall
                | TokenType::SymbolFormals
                | TokenType::SymbolSub
                | TokenType::SymbolPackage
        )
    }

    /// Comments and line breaks
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenType::Comment | TokenType::Newline)
    }
}

/// A token or value record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub token_type: TokenType,
    /// Exact source text of the token
    pub value: String,
    /// Integral value of numeric constants; line-break count of newlines
    pub int_value: i64,
    pub span: Span,
}

impl Node {
    pub fn new(token_type: TokenType, value: impl Into<String>, span: Span) -> Self {
        Node {
            token_type,
            value: value.into(),
            int_value: 0,
            span,
        }
    }

    pub fn with_int(
        token_type: TokenType,
        value: impl Into<String>,
        int_value: i64,
        span: Span,
    ) -> Self {
        Node {
            token_type,
            value: value.into(),
            int_value,
            span,
        }
    }

    /// A rendered expression, e.g. the default value of a formal
    pub fn expr(value: impl Into<String>, span: Span) -> Self {
        Node::new(TokenType::Expr, value, span)
    }

    pub fn is(&self, token_type: TokenType) -> bool {
        self.token_type == token_type
    }
}

/// A named association between an identifier and a value node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub token_type: TokenType,
    pub name: String,
    pub value: Option<Node>,
}

impl Field {
    pub fn new(token_type: TokenType, name: impl Into<String>, value: Option<Node>) -> Self {
        Field {
            token_type,
            name: name.into(),
            value,
        }
    }

    pub fn has_default(&self) -> bool {
        self.value.is_some()
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.value {
            Some(node) => write!(f, "{} = {}", self.name, node.value),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A parsed R source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Classified tokens, trivia included, `Eof` excluded
    pub tokens: List,
    pub functions: Vec<FunctionDef>,
    /// Packages attached or referenced, in first-seen order
    pub packages: List,
}

/// `name <- function(formals)` found anywhere in a file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub formals: List<Field>,
    pub span: Span,
}

impl std::fmt::Display for FunctionDef {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let formals: Vec<String> = self.formals.iter().map(|field| field.to_string()).collect();
        write!(f, "{}({})", self.name, formals.join(", "))
    }
}
