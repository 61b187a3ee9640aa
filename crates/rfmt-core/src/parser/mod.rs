//! R parser: tokenizer, data model, bracket validation and classification
//!
//! rfmt does not build a full expression tree. Layout decisions only need
//! balanced brackets and a few token refinements R itself makes in its
//! parse data: call symbols, package prefixes, function formals and named
//! call arguments. On top of that the parser extracts an outline (function
//! definitions and the packages a file depends on).

pub mod ast;
pub mod tokenizer;

use std::collections::HashMap;

use tracing::debug;

use crate::list::List;
use crate::{Error, Result};
use ast::*;
use tokenizer::Tokenizer;

/// Functions whose first argument names a package
const ATTACH_FUNCTIONS: &[&str] = &["library", "require", "requireNamespace", "loadNamespace"];

/// Parse R source into classified tokens plus an outline
///
/// # Errors
/// Returns `ParseError` with line:column for lexical errors and
/// unbalanced brackets.
pub fn parse(text: &str) -> Result<SourceFile> {
    let mut tokens = Tokenizer::new(text).tokenize()?;
    tokens.pop(); // Eof

    let matches = match_brackets(&tokens)?;
    classify(&mut tokens, &matches);

    let functions = find_functions(&tokens, &matches);
    let packages = find_packages(&tokens, &matches);

    debug!(
        tokens = tokens.len(),
        functions = functions.len(),
        packages = packages.len(),
        "parsed R source"
    );

    Ok(SourceFile {
        tokens: List::from_vec(TokenType::Program, tokens),
        functions,
        packages,
    })
}

// ── Bracket matching ──────────────────────────────────────

/// Maps each opener index to the index of its (last) closing token.
///
/// `[[` is closed by two `]` tokens, possibly separated by whitespace,
/// so it is pushed twice.
fn match_brackets(tokens: &[Node]) -> Result<HashMap<usize, usize>> {
    let mut matches = HashMap::new();
    let mut stack: Vec<usize> = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        match token.token_type {
            TokenType::LParen | TokenType::LBrace | TokenType::LBracket => stack.push(i),
            TokenType::LBB => {
                stack.push(i);
                stack.push(i);
            }
            TokenType::RParen | TokenType::RBrace | TokenType::RBracket => {
                let Some(open) = stack.pop() else {
                    return Err(Error::ParseError(format!(
                        "Unexpected '{}' at {}",
                        token.value, token.span
                    )));
                };
                let opener = &tokens[open];
                if closer_for(opener.token_type) != token.token_type {
                    return Err(Error::ParseError(format!(
                        "Mismatched '{}' at {}: '{}' opened at {} is still open",
                        token.value, token.span, opener.value, opener.span
                    )));
                }
                matches.insert(open, i);
            }
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        let opener = &tokens[open];
        return Err(Error::ParseError(format!(
            "Unclosed '{}' opened at {}",
            opener.value, opener.span
        )));
    }

    Ok(matches)
}

fn closer_for(opener: TokenType) -> TokenType {
    match opener {
        TokenType::LParen => TokenType::RParen,
        TokenType::LBrace => TokenType::RBrace,
        _ => TokenType::RBracket,
    }
}

// ── Token helpers ─────────────────────────────────────────

/// Next non-trivia index after `i`
fn next_significant(tokens: &[Node], i: usize) -> Option<usize> {
    (i + 1..tokens.len()).find(|&j| !tokens[j].token_type.is_trivia())
}

/// Previous non-trivia index before `i`
fn prev_significant(tokens: &[Node], i: usize) -> Option<usize> {
    (0..i).rev().find(|&j| !tokens[j].token_type.is_trivia())
}

/// Indices of the direct children of the bracket group `open..close`,
/// skipping over nested groups and trivia.
fn direct_children(tokens: &[Node], matches: &HashMap<usize, usize>, open: usize) -> Vec<usize> {
    let Some(&close) = matches.get(&open) else {
        return Vec::new();
    };
    let mut children = Vec::new();
    let mut k = open + 1;
    // `[[` groups end with two brackets; stop before both
    let end = if tokens[open].is(TokenType::LBB) {
        prev_bracket(tokens, close)
    } else {
        close
    };
    while k < end {
        if !tokens[k].token_type.is_trivia() {
            children.push(k);
        }
        k = match matches.get(&k) {
            Some(&inner_close) => inner_close + 1,
            None => k + 1,
        };
    }
    children
}

/// Index of the `]` before the final `]` of a `[[` group
fn prev_bracket(tokens: &[Node], close: usize) -> usize {
    (0..close)
        .rev()
        .find(|&j| tokens[j].is(TokenType::RBracket))
        .unwrap_or(close)
}

/// Splits direct children into comma-separated segments
fn split_on_commas(tokens: &[Node], children: &[usize]) -> Vec<Vec<usize>> {
    let mut segments = vec![Vec::new()];
    for &k in children {
        if tokens[k].is(TokenType::Comma) {
            segments.push(Vec::new());
        } else if let Some(last) = segments.last_mut() {
            last.push(k);
        }
    }
    segments
}

// ── Classification ────────────────────────────────────────

fn classify(tokens: &mut [Node], matches: &HashMap<usize, usize>) {
    // Call symbols and package prefixes
    for i in 0..tokens.len() {
        if !tokens[i].is(TokenType::Symbol) {
            continue;
        }
        match tokens.get(i + 1).map(|n| n.token_type) {
            Some(TokenType::LParen) => tokens[i].token_type = TokenType::SymbolFunctionCall,
            Some(TokenType::NsGet) | Some(TokenType::NsGetInt) => {
                tokens[i].token_type = TokenType::SymbolPackage
            }
            _ => {}
        }
    }

    for open in 0..tokens.len() {
        if !tokens[open].token_type.is_opener() || tokens[open].is(TokenType::LBrace) {
            continue;
        }
        let before = prev_significant(tokens, open).map(|j| tokens[j].token_type);
        let formals = tokens[open].is(TokenType::LParen)
            && matches!(before, Some(TokenType::Function) | Some(TokenType::Lambda));
        let call = !formals && is_call_opener(tokens, matches, open);
        if !formals && !call {
            continue;
        }

        for segment in split_on_commas(tokens, &direct_children(tokens, matches, open)) {
            let eq = segment.iter().position(|&k| tokens[k].is(TokenType::EqAssign));
            if formals {
                if let Some(&first) = segment.first() {
                    if tokens[first].is(TokenType::Symbol) {
                        tokens[first].token_type = TokenType::SymbolFormals;
                    }
                }
                if let Some(pos) = eq {
                    tokens[segment[pos]].token_type = TokenType::EqFormals;
                }
            } else if let Some(pos) = eq {
                tokens[segment[pos]].token_type = TokenType::EqSub;
                if pos == 1 && tokens[segment[0]].is(TokenType::Symbol) {
                    tokens[segment[0]].token_type = TokenType::SymbolSub;
                }
            }
        }
    }
}

/// `(` following a callee, or any `[`/`[[` (indexing takes named arguments too)
fn is_call_opener(tokens: &[Node], matches: &HashMap<usize, usize>, open: usize) -> bool {
    if matches!(tokens[open].token_type, TokenType::LBracket | TokenType::LBB) {
        return true;
    }
    let Some(prev) = open.checked_sub(1) else {
        return false;
    };
    match tokens[prev].token_type {
        TokenType::SymbolFunctionCall | TokenType::StrConst | TokenType::RBracket => true,
        TokenType::RParen => !closes_header(tokens, matches, prev),
        _ => false,
    }
}

/// Whether the `)` at `close` ends an `if`/`for`/`while`/`function` header
fn closes_header(tokens: &[Node], matches: &HashMap<usize, usize>, close: usize) -> bool {
    matches
        .iter()
        .find(|(_, &c)| c == close)
        .and_then(|(&open, _)| prev_significant(tokens, open))
        .is_some_and(|j| {
            matches!(
                tokens[j].token_type,
                TokenType::If
                    | TokenType::For
                    | TokenType::While
                    | TokenType::Function
                    | TokenType::Lambda
            )
        })
}

// ── Outline ───────────────────────────────────────────────

fn find_functions(tokens: &[Node], matches: &HashMap<usize, usize>) -> Vec<FunctionDef> {
    let mut functions = Vec::new();

    for i in 0..tokens.len() {
        let name = &tokens[i];
        if !(name.token_type.is_symbol_like() || name.is(TokenType::StrConst)) {
            continue;
        }
        let Some(assign) = next_significant(tokens, i) else {
            continue;
        };
        let is_assign = match tokens[assign].token_type {
            TokenType::LeftAssign => tokens[assign].value != ":=",
            TokenType::EqAssign => true,
            _ => false,
        };
        if !is_assign {
            continue;
        }
        let Some(keyword) = next_significant(tokens, assign) else {
            continue;
        };
        if !matches!(
            tokens[keyword].token_type,
            TokenType::Function | TokenType::Lambda
        ) {
            continue;
        }
        let Some(open) = next_significant(tokens, keyword) else {
            continue;
        };
        if !tokens[open].is(TokenType::LParen) {
            continue;
        }

        let mut formals = List::new(TokenType::Formals);
        for segment in split_on_commas(tokens, &direct_children(tokens, matches, open)) {
            let Some(&first) = segment.first() else {
                continue;
            };
            let default = match segment.get(1) {
                Some(&eq) if tokens[eq].is(TokenType::EqFormals) && segment.len() > 2 => {
                    let value_start = segment[2];
                    let value_end = segment_end(matches, *segment.last().unwrap_or(&eq));
                    let rendered = crate::formatter::render_inline(&tokens[value_start..=value_end]);
                    Some(Node::expr(rendered, tokens[value_start].span))
                }
                _ => None,
            };
            let token_type = if default.is_some() {
                TokenType::EqFormals
            } else {
                TokenType::SymbolFormals
            };
            formals.push_back(Field::new(token_type, tokens[first].value.clone(), default));
        }

        functions.push(FunctionDef {
            name: unquote(&name.value),
            formals,
            span: name.span,
        });
    }

    functions
}

/// Last token index covered by a direct child (its closer if it opens a group)
fn segment_end(matches: &HashMap<usize, usize>, last: usize) -> usize {
    matches.get(&last).copied().unwrap_or(last)
}

fn find_packages(tokens: &[Node], matches: &HashMap<usize, usize>) -> List {
    let mut packages: List = List::new(TokenType::Packages);
    let mut add = |name: String, node: &Node| {
        if !packages.iter().any(|p| p.value == name) {
            packages.push_back(Node::new(TokenType::Symbol, name, node.span));
        }
    };

    for (i, token) in tokens.iter().enumerate() {
        match token.token_type {
            TokenType::SymbolPackage => add(unquote(&token.value), token),
            TokenType::SymbolFunctionCall if ATTACH_FUNCTIONS.contains(&token.value.as_str()) => {
                let args = split_on_commas(tokens, &direct_children(tokens, matches, i + 1));
                let uses_character_only = args.iter().any(|arg| {
                    arg.first()
                        .is_some_and(|&k| tokens[k].is(TokenType::SymbolSub) && tokens[k].value == "character.only")
                });
                if uses_character_only {
                    continue;
                }
                if let Some([k]) = args.first().map(|a| a.as_slice()) {
                    let arg = &tokens[*k];
                    if arg.is(TokenType::Symbol) || arg.is(TokenType::StrConst) {
                        add(unquote(&arg.value), arg);
                    }
                }
            }
            _ => {}
        }
    }

    packages
}

/// Strips surrounding quotes or backquotes from a name
fn unquote(text: &str) -> String {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && matches!(first, b'"' | b'\'' | b'`') {
            return text[1..text.len() - 1].to_string();
        }
    }
    text.to_string()
}
