//! Lexical analysis for beacon configuration files.
//!
//! Tokenization uses logos. Whitespace and comments (`//` line comments and
//! `/* */` block comments) are stripped during lexing and never reach the
//! parser.

use logos::Logos;
use std::fmt;

/// A beacon configuration token.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*[^/])*\*/")]
pub enum Token {
    /// Keyword `true`
    #[token("true")]
    True,
    /// Keyword `false`
    #[token("false")]
    False,
    /// Keyword `null`
    #[token("null")]
    Null,

    /// Identifier (a single path segment; dotted paths are parsed from
    /// `Ident Dot Ident` sequences)
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    /// Double-quoted string literal, unescaped
    #[regex(r#""([^"\\\n]|\\.)*""#, unescape)]
    String(String),

    /// Numeric literal
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    #[token("=")]
    Assign,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("!")]
    Bang,
}

/// Strip the surrounding quotes and process escape sequences.
fn unescape(lex: &mut logos::Lexer<Token>) -> String {
    let raw = lex.slice();
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Null => write!(f, "null"),
            Token::Ident(name) => write!(f, "identifier {name:?}"),
            Token::String(s) => write!(f, "string {s:?}"),
            Token::Number(n) => write!(f, "number {n}"),
            Token::Assign => write!(f, "\"=\""),
            Token::LBrace => write!(f, "\"{{\""),
            Token::RBrace => write!(f, "\"}}\""),
            Token::LBracket => write!(f, "\"[\""),
            Token::RBracket => write!(f, "\"]\""),
            Token::LParen => write!(f, "\"(\""),
            Token::RParen => write!(f, "\")\""),
            Token::Comma => write!(f, "\",\""),
            Token::Dot => write!(f, "\".\""),
            Token::Plus => write!(f, "\"+\""),
            Token::Minus => write!(f, "\"-\""),
            Token::Star => write!(f, "\"*\""),
            Token::Slash => write!(f, "\"/\""),
            Token::Percent => write!(f, "\"%\""),
            Token::EqEq => write!(f, "\"==\""),
            Token::NotEq => write!(f, "\"!=\""),
            Token::Lt => write!(f, "\"<\""),
            Token::LtEq => write!(f, "\"<=\""),
            Token::Gt => write!(f, "\">\""),
            Token::GtEq => write!(f, "\">=\""),
            Token::AndAnd => write!(f, "\"&&\""),
            Token::OrOr => write!(f, "\"||\""),
            Token::Bang => write!(f, "\"!\""),
        }
    }
}
