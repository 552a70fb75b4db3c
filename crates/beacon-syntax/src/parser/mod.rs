//! Hand-written recursive descent parser for beacon configuration files.
//!
//! # Architecture
//!
//! - `stream` — [`TokenStream`] lookahead wrapper plus source positions
//! - `expr` — expression parser (precedence climbing)
//! - this module — statement/block parsing and the block-list adapter
//!
//! Parsing is best-effort. A malformed statement yields a diagnostic and
//! the parser resynchronizes at the next statement boundary, so a single
//! pass reports as many problems as possible.

mod expr;
mod stream;

use crate::ast::{AttributeStmt, BlockStmt, File, Span, Stmt};
use crate::diag::{Diagnostic, Diagnostics};
use crate::token::Token;
use logos::Logos;
use stream::{SourceContext, TokenStream};

/// Parse a full configuration file.
///
/// Returns the file (possibly partial, when errors were recovered from)
/// together with all diagnostics produced while lexing and parsing.
pub fn parse_file(name: &str, src: &str) -> (File, Diagnostics) {
    let ctx = SourceContext::new(name, src);
    let mut diags = Diagnostics::new();

    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(src);
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => diags.push(Diagnostic::error("invalid token", &ctx.span(span))),
        }
    }

    let mut stream = TokenStream::new(&tokens, &ctx);
    let mut body = Vec::new();
    while !stream.at_end() {
        match parse_stmt(&mut stream) {
            Ok(stmt) => body.push(stmt),
            Err(diag) => {
                diags.push(diag);
                stream.synchronize();
            }
        }
    }

    (
        File {
            name: name.to_string(),
            body,
        },
        diags,
    )
}

/// Parse a source into its flat list of top-level block statements.
///
/// This is the adapter the loader consumes: any non-block top-level
/// statement is reported as `unexpected statement` with its span, and
/// extraction continues so multiple problems surface in one apply.
pub fn parse_blocks(name: &str, src: &str) -> (Vec<BlockStmt>, Diagnostics) {
    let (file, mut diags) = parse_file(name, src);
    let mut blocks = Vec::new();
    for stmt in file.body {
        match stmt {
            Stmt::Block(block) => blocks.push(block),
            Stmt::Attribute(attr) => {
                diags.push(Diagnostic::error("unexpected statement", &attr.span));
            }
        }
    }
    (blocks, diags)
}

fn parse_stmt(s: &mut TokenStream) -> Result<Stmt, Diagnostic> {
    let start = s.current_start();
    let first = s.eat_ident()?;

    // `ident = expr` is an attribute; anything else continues as a block
    // header.
    if s.check(&Token::Assign) {
        s.advance();
        let value = expr::parse_expr(s)?;
        let span = s.span_from(start);
        return Ok(Stmt::Attribute(AttributeStmt {
            name: first,
            value,
            span,
        }));
    }

    let mut name = vec![first];
    while s.check(&Token::Dot) {
        s.advance();
        name.push(s.eat_ident()?);
    }

    let label = match s.peek() {
        Some(Token::String(label)) => {
            let label = label.clone();
            s.advance();
            Some(label)
        }
        _ => None,
    };

    s.expect(Token::LBrace)?;
    let mut body = Vec::new();
    while !s.check(&Token::RBrace) {
        if s.at_end() {
            return Err(s.error_here("unexpected end of file, expected \"}\""));
        }
        body.push(parse_stmt(s)?);
    }
    s.expect(Token::RBrace)?;

    Ok(Stmt::Block(BlockStmt {
        name,
        label,
        body,
        span: Span::new(start, s.prev_end()),
    }))
}
