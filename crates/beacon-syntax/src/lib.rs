//! Configuration language for the beacon telemetry agent.
//!
//! Beacon configuration is a flat list of blocks of the form
//! `name "label" { body }`, where `name` is a dotted identifier, the label is
//! optional, and the body holds attribute assignments (`ident = expression`)
//! and nested blocks.
//!
//! # Design
//!
//! - `token` — logos-derived lexer
//! - `ast` — positions, statements, blocks, expressions
//! - `parser` — hand-written recursive descent parser with error recovery
//! - `diag` — severity-ranked, positioned diagnostics
//!
//! Parsing is best-effort: a malformed statement produces a diagnostic and
//! the parser resynchronizes, so one pass over a document surfaces as many
//! problems as possible.

pub mod ast;
pub mod diag;
pub mod parser;
pub mod token;

pub use ast::{AttributeStmt, BlockStmt, Expr, ExprKind, File, Position, Span, Stmt};
pub use diag::{Diagnostic, Diagnostics, Severity};
pub use parser::{parse_blocks, parse_file};
