//! Abstract syntax tree for beacon configuration files.
//!
//! The parser produces a [`File`] holding a flat list of statements. A
//! statement is either an attribute assignment or a block; block bodies nest
//! the same statement forms. Expressions stay untyped: the loader inspects
//! them for identifier-path references, and value evaluation is the
//! embedder's concern.
//!
//! Every node carries a [`Span`] of rich [`Position`]s (source name, byte
//! offset, line, column). Positions cross the loader API boundary embedded
//! in the nodes themselves, so diagnostics can cite declaration sites
//! without access to the original source text.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved source location.
///
/// Line and column are 1-based. The zero value (see [`Position::none`])
/// marks synthesized nodes that have no source location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Name of the source this position points into.
    pub source: String,
    /// Byte offset from the start of the source.
    pub offset: usize,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

impl Position {
    /// The zero position, used by blocks the loader synthesizes.
    pub fn none() -> Self {
        Self::default()
    }

    /// True if this is the zero position.
    pub fn is_none(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source, self.line, self.column)
    }
}

/// A source range between two positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A span covering nothing, for synthesized nodes.
    pub fn none() -> Self {
        Self::default()
    }
}

/// A parsed configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    /// Source name the file was parsed from.
    pub name: String,
    /// Top-level statements in source order.
    pub body: Vec<Stmt>,
}

/// A statement inside a file or block body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Attribute(AttributeStmt),
    Block(BlockStmt),
}

impl Stmt {
    pub fn span(&self) -> &Span {
        match self {
            Stmt::Attribute(attr) => &attr.span,
            Stmt::Block(block) => &block.span,
        }
    }
}

/// An attribute assignment, `name = expression`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeStmt {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

/// A block statement, `name ["label"] { body }`.
///
/// Block names are dotted; `name` holds the individual segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockStmt {
    pub name: Vec<String>,
    pub label: Option<String>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl BlockStmt {
    /// The dotted block name, e.g. `pkg.kind`.
    pub fn full_name(&self) -> String {
        self.name.join(".")
    }

    /// The node id this block declares: the dotted name, plus the label as a
    /// final segment when one is present. `pkg.kind "label"` → `pkg.kind.label`.
    pub fn id(&self) -> String {
        match &self.label {
            Some(label) if !label.is_empty() => format!("{}.{}", self.full_name(), label),
            _ => self.full_name(),
        }
    }

    /// Structural equality ignoring source positions.
    ///
    /// The loader's reuse rule compares raw block bodies; two blocks that
    /// differ only in where they sit in the document are the same content.
    pub fn same_content(&self, other: &BlockStmt) -> bool {
        self.name == other.name
            && self.label == other.label
            && stmts_eq(&self.body, &other.body)
    }
}

fn stmts_eq(a: &[Stmt], b: &[Stmt]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(x, y)| match (x, y) {
            (Stmt::Attribute(x), Stmt::Attribute(y)) => {
                x.name == y.name && exprs_eq(&x.value, &y.value)
            }
            (Stmt::Block(x), Stmt::Block(y)) => x.same_content(y),
            _ => false,
        })
}

fn exprs_eq(a: &Expr, b: &Expr) -> bool {
    use ExprKind::*;
    match (&a.kind, &b.kind) {
        (String(x), String(y)) => x == y,
        (Number(x), Number(y)) => x == y,
        (Bool(x), Bool(y)) => x == y,
        (Null, Null) => true,
        (Array(x), Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| exprs_eq(x, y))
        }
        (Reference(x), Reference(y)) => x == y,
        (
            Call { func: xf, args: xa },
            Call { func: yf, args: ya },
        ) => xf == yf && xa.len() == ya.len() && xa.iter().zip(ya).all(|(x, y)| exprs_eq(x, y)),
        (
            Binary { op: xo, lhs: xl, rhs: xr },
            Binary { op: yo, lhs: yl, rhs: yr },
        ) => xo == yo && exprs_eq(xl, yl) && exprs_eq(xr, yr),
        (
            Unary { op: xo, expr: xe },
            Unary { op: yo, expr: ye },
        ) => xo == yo && exprs_eq(xe, ye),
        _ => false,
    }
}

/// An untyped expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Visit every identifier-path reference in this expression, in source
    /// order. Every occurrence is visited separately; duplicates of the
    /// same path are not collapsed.
    pub fn walk_references<'a>(&'a self, f: &mut impl FnMut(&'a [String], &'a Span)) {
        match &self.kind {
            ExprKind::Reference(path) => f(path, &self.span),
            ExprKind::Array(items) => {
                for item in items {
                    item.walk_references(f);
                }
            }
            ExprKind::Call { args, .. } => {
                for arg in args {
                    arg.walk_references(f);
                }
            }
            ExprKind::Binary { lhs, rhs, .. } => {
                lhs.walk_references(f);
                rhs.walk_references(f);
            }
            ExprKind::Unary { expr, .. } => expr.walk_references(f),
            ExprKind::String(_) | ExprKind::Number(_) | ExprKind::Bool(_) | ExprKind::Null => {}
        }
    }
}

/// Expression kinds.
///
/// `Call` function names are dotted paths (`string.join`) but are not
/// references: they name stdlib functions, not graph nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
    Array(Vec<Expr>),
    /// A dotted identifier path referencing another node's exported value.
    Reference(Vec<String>),
    Call {
        func: Vec<String>,
        args: Vec<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span_at(line: u32) -> Span {
        Span::new(
            Position {
                source: "test".into(),
                offset: 0,
                line,
                column: 1,
            },
            Position {
                source: "test".into(),
                offset: 1,
                line,
                column: 2,
            },
        )
    }

    fn reference(path: &[&str], line: u32) -> Expr {
        Expr::new(
            ExprKind::Reference(path.iter().map(|s| s.to_string()).collect()),
            span_at(line),
        )
    }

    #[test]
    fn test_block_id() {
        let block = BlockStmt {
            name: vec!["pkg".into(), "kind".into()],
            label: Some("label".into()),
            body: vec![],
            span: Span::none(),
        };
        assert_eq!(block.full_name(), "pkg.kind");
        assert_eq!(block.id(), "pkg.kind.label");

        let unlabelled = BlockStmt {
            name: vec!["logging".into()],
            label: None,
            body: vec![],
            span: Span::none(),
        };
        assert_eq!(unlabelled.id(), "logging");
    }

    #[test]
    fn test_same_content_ignores_positions() {
        let make = |line| BlockStmt {
            name: vec!["tick".into()],
            label: Some("t".into()),
            body: vec![Stmt::Attribute(AttributeStmt {
                name: "frequency".into(),
                value: Expr::new(ExprKind::String("1s".into()), span_at(line)),
                span: span_at(line),
            })],
            span: span_at(line),
        };
        assert!(make(1).same_content(&make(7)));
    }

    #[test]
    fn test_same_content_detects_changed_value() {
        let make = |value: &str| BlockStmt {
            name: vec!["tick".into()],
            label: Some("t".into()),
            body: vec![Stmt::Attribute(AttributeStmt {
                name: "frequency".into(),
                value: Expr::new(ExprKind::String(value.into()), span_at(1)),
                span: span_at(1),
            })],
            span: span_at(1),
        };
        assert!(!make("1s").same_content(&make("1m")));
    }

    #[test]
    fn test_walk_references_preserves_multiplicity_and_order() {
        // one.output + one.output, then a call argument
        let expr = Expr::new(
            ExprKind::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(reference(&["one", "output"], 1)),
                rhs: Box::new(Expr::new(
                    ExprKind::Call {
                        func: vec!["string".into(), "join".into()],
                        args: vec![reference(&["one", "output"], 2)],
                    },
                    span_at(2),
                )),
            },
            span_at(1),
        );

        let mut seen = Vec::new();
        expr.walk_references(&mut |path, _| seen.push(path.join(".")));
        assert_eq!(seen, vec!["one.output", "one.output"]);
    }
}
