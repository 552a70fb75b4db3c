//! Dependency analysis: discover the edges a node's expressions imply.
//!
//! Every attribute expression in a node's block body (nested blocks
//! included) is inspected for identifier paths. The longest prefix of a
//! path that matches a node id in the symbol table defines an edge from the
//! referring node to the matched node; the remainder of the path addresses
//! a value inside the target's exports and is left to the evaluator.
//!
//! A path whose first segment matches a known namespace prefix but which
//! resolves to no node is an unresolved reference: the apply fails and the
//! published graph is reset to empty. Paths outside the known prefixes
//! (locals, stdlib calls like `string.join`) are not references.

use crate::node::Node;
use beacon_syntax::ast::{Expr, Stmt};
use beacon_syntax::diag::{Diagnostic, Diagnostics};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Result of one analysis pass over the symbol table.
pub(crate) struct Analysis {
    /// Discovered `(from, to)` edges in encounter order; duplicates kept.
    pub edges: Vec<(String, String)>,
    /// `(target, source)` pairs, one per reference occurrence, in
    /// encounter order. Drives the data-flow consumer lists.
    pub consumers: Vec<(String, String)>,
    pub diags: Diagnostics,
    /// True when at least one reference failed to resolve.
    pub invalid_reference: bool,
}

/// Analyze every node in the symbol table.
pub(crate) fn analyze(nodes: &IndexMap<String, Node>) -> Analysis {
    let prefixes: HashSet<&str> = nodes
        .keys()
        .filter_map(|id| id.split('.').next())
        .collect();

    let mut analysis = Analysis {
        edges: Vec::new(),
        consumers: Vec::new(),
        diags: Diagnostics::new(),
        invalid_reference: false,
    };

    for (id, node) in nodes {
        walk_attribute_exprs(&node.block().body, &mut |expr| {
            expr.walk_references(&mut |path, span| {
                match resolve_longest_prefix(nodes, path) {
                    Some(target) => {
                        analysis.edges.push((id.clone(), target.clone()));
                        analysis.consumers.push((target, id.clone()));
                    }
                    None if prefixes.contains(path[0].as_str()) => {
                        analysis.diags.push(Diagnostic::error(
                            format!(
                                "component \"{}\" does not exist or is out of scope",
                                path.join(".")
                            ),
                            span,
                        ));
                        analysis.invalid_reference = true;
                    }
                    None => {}
                }
            });
        });
    }

    analysis
}

/// Longest prefix of `path` that names a node, as an id string.
fn resolve_longest_prefix(nodes: &IndexMap<String, Node>, path: &[String]) -> Option<String> {
    for len in (1..=path.len()).rev() {
        let candidate = path[..len].join(".");
        if nodes.contains_key(&candidate) {
            return Some(candidate);
        }
    }
    None
}

fn walk_attribute_exprs<'a>(stmts: &'a [Stmt], f: &mut impl FnMut(&'a Expr)) {
    for stmt in stmts {
        match stmt {
            Stmt::Attribute(attr) => f(&attr.value),
            Stmt::Block(block) => walk_attribute_exprs(&block.body, f),
        }
    }
}
