//! Expression parsing.
//!
//! Precedence climbing over a small operator set. Identifier paths parse as
//! [`ExprKind::Reference`] unless immediately followed by an argument list,
//! in which case they are a stdlib [`ExprKind::Call`].

use super::stream::TokenStream;
use crate::ast::{BinaryOp, Expr, ExprKind, Span, UnaryOp};
use crate::diag::Diagnostic;
use crate::token::Token;

pub(super) fn parse_expr(s: &mut TokenStream) -> Result<Expr, Diagnostic> {
    parse_binary(s, 1)
}

/// Operator and left binding power for infix tokens.
fn infix(token: &Token) -> Option<(BinaryOp, u8)> {
    Some(match token {
        Token::OrOr => (BinaryOp::Or, 1),
        Token::AndAnd => (BinaryOp::And, 2),
        Token::EqEq => (BinaryOp::Eq, 3),
        Token::NotEq => (BinaryOp::NotEq, 3),
        Token::Lt => (BinaryOp::Lt, 4),
        Token::LtEq => (BinaryOp::LtEq, 4),
        Token::Gt => (BinaryOp::Gt, 4),
        Token::GtEq => (BinaryOp::GtEq, 4),
        Token::Plus => (BinaryOp::Add, 5),
        Token::Minus => (BinaryOp::Sub, 5),
        Token::Star => (BinaryOp::Mul, 6),
        Token::Slash => (BinaryOp::Div, 6),
        Token::Percent => (BinaryOp::Mod, 6),
        _ => return None,
    })
}

fn parse_binary(s: &mut TokenStream, min_power: u8) -> Result<Expr, Diagnostic> {
    let mut lhs = parse_unary(s)?;
    while let Some((op, power)) = s.peek().and_then(infix) {
        if power < min_power {
            break;
        }
        s.advance();
        let rhs = parse_binary(s, power + 1)?;
        let span = Span::new(lhs.span.start.clone(), rhs.span.end.clone());
        lhs = Expr::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        );
    }
    Ok(lhs)
}

fn parse_unary(s: &mut TokenStream) -> Result<Expr, Diagnostic> {
    let op = match s.peek() {
        Some(Token::Minus) => Some(UnaryOp::Neg),
        Some(Token::Bang) => Some(UnaryOp::Not),
        _ => None,
    };
    let Some(op) = op else {
        return parse_primary(s);
    };

    let start = s.current_start();
    s.advance();
    let expr = parse_unary(s)?;
    let span = Span::new(start, expr.span.end.clone());
    Ok(Expr::new(
        ExprKind::Unary {
            op,
            expr: Box::new(expr),
        },
        span,
    ))
}

fn parse_primary(s: &mut TokenStream) -> Result<Expr, Diagnostic> {
    let start = s.current_start();
    match s.peek() {
        Some(Token::Number(value)) => {
            let value = *value;
            s.advance();
            Ok(Expr::new(ExprKind::Number(value), s.span_from(start)))
        }
        Some(Token::String(value)) => {
            let value = value.clone();
            s.advance();
            Ok(Expr::new(ExprKind::String(value), s.span_from(start)))
        }
        Some(Token::True) => {
            s.advance();
            Ok(Expr::new(ExprKind::Bool(true), s.span_from(start)))
        }
        Some(Token::False) => {
            s.advance();
            Ok(Expr::new(ExprKind::Bool(false), s.span_from(start)))
        }
        Some(Token::Null) => {
            s.advance();
            Ok(Expr::new(ExprKind::Null, s.span_from(start)))
        }
        Some(Token::LBracket) => parse_array(s, start),
        Some(Token::LParen) => {
            s.advance();
            let inner = parse_expr(s)?;
            s.expect(Token::RParen)?;
            Ok(inner)
        }
        Some(Token::Ident(_)) => parse_path(s, start),
        Some(t) => Err(s.error_here(format!("expected expression, got {t}"))),
        None => Err(s.error_here("unexpected end of file, expected expression")),
    }
}

fn parse_array(s: &mut TokenStream, start: crate::ast::Position) -> Result<Expr, Diagnostic> {
    s.expect(Token::LBracket)?;
    let mut items = Vec::new();
    while !s.check(&Token::RBracket) {
        items.push(parse_expr(s)?);
        if !s.check(&Token::Comma) {
            break;
        }
        s.advance();
    }
    s.expect(Token::RBracket)?;
    Ok(Expr::new(ExprKind::Array(items), s.span_from(start)))
}

/// A dotted identifier path, optionally followed by a call argument list.
fn parse_path(s: &mut TokenStream, start: crate::ast::Position) -> Result<Expr, Diagnostic> {
    let mut path = vec![s.eat_ident()?];
    while s.check(&Token::Dot) {
        s.advance();
        path.push(s.eat_ident()?);
    }

    if !s.check(&Token::LParen) {
        return Ok(Expr::new(ExprKind::Reference(path), s.span_from(start)));
    }

    s.advance();
    let mut args = Vec::new();
    while !s.check(&Token::RParen) {
        args.push(parse_expr(s)?);
        if !s.check(&Token::Comma) {
            break;
        }
        s.advance();
    }
    s.expect(Token::RParen)?;
    Ok(Expr::new(
        ExprKind::Call { func: path, args },
        s.span_from(start),
    ))
}
