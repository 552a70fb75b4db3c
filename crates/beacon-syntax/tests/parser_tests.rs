//! Parser integration tests over full configuration sources.

use beacon_syntax::ast::{BinaryOp, ExprKind, Stmt};
use beacon_syntax::{parse_blocks, parse_file};

#[test]
fn full_document_parses() {
    let src = r#"
logging {
	level = "debug"
	format = "logfmt"
}

tick "ticker" {
	frequency = "1s"
}

passthrough "forwarded" {
	input = passthrough.ticker.output
	lag = passthrough.ticker.output + "s"
}
"#;
    let (blocks, diags) = parse_blocks("agent.bcn", src);
    assert!(diags.is_empty(), "unexpected diagnostics: {diags}");
    let ids: Vec<_> = blocks.iter().map(|b| b.id()).collect();
    assert_eq!(ids, vec!["logging", "tick.ticker", "passthrough.forwarded"]);
}

#[test]
fn operator_precedence() {
    let (file, diags) = parse_file("test", "x = a.b + c.d * 2\n");
    assert!(diags.is_empty());
    let Stmt::Attribute(attr) = &file.body[0] else {
        panic!("expected attribute");
    };
    // Multiplication binds tighter: a.b + (c.d * 2)
    let ExprKind::Binary { op, rhs, .. } = &attr.value.kind else {
        panic!("expected binary expression");
    };
    assert_eq!(*op, BinaryOp::Add);
    assert!(matches!(
        &rhs.kind,
        ExprKind::Binary {
            op: BinaryOp::Mul,
            ..
        }
    ));
}

#[test]
fn call_with_array_argument() {
    let (file, diags) = parse_file("test", "frequency = string.join([\"1\", \"s\"], \"\")\n");
    assert!(diags.is_empty());
    let Stmt::Attribute(attr) = &file.body[0] else {
        panic!("expected attribute");
    };
    let ExprKind::Call { func, args } = &attr.value.kind else {
        panic!("expected call, got {:?}", attr.value.kind);
    };
    assert_eq!(func.join("."), "string.join");
    assert_eq!(args.len(), 2);
    assert!(matches!(&args[0].kind, ExprKind::Array(items) if items.len() == 2));
}

#[test]
fn multiple_errors_surface_in_one_pass() {
    let src = "tick ! {}\nversion = 1\npassthrough \"ok\" {}\nalso bad@\n";
    let (blocks, diags) = parse_blocks("test", src);
    // The well-formed block still comes through.
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].id(), "passthrough.ok");
    // The malformed block, the top-level attribute and the invalid token
    // each produce their own diagnostic.
    assert!(diags.len() >= 3, "expected several diagnostics, got: {diags}");
    assert!(diags.to_string().contains("unexpected statement"));
    assert!(diags.to_string().contains("invalid token"));
}

#[test]
fn block_positions_point_at_the_declaration() {
    let (blocks, diags) = parse_blocks("agent.bcn", "\n\ntick \"t\" {\n\tfrequency = \"1s\"\n}\n");
    assert!(diags.is_empty());
    let span = &blocks[0].span;
    assert_eq!(span.start.to_string(), "agent.bcn:3:1");
    assert_eq!(span.end.line, 5);
}

#[test]
fn empty_label_is_preserved_for_the_loader() {
    // The parser accepts an empty label; rejecting it is the loader's job.
    let (blocks, diags) = parse_blocks("test", "tick \"\" {}\n");
    assert!(diags.is_empty());
    assert_eq!(blocks[0].label.as_deref(), Some(""));
    assert_eq!(blocks[0].id(), "tick");
}
