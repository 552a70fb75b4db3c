//! The dependency graph published by the loader.
//!
//! Nodes are keyed by id in insertion order; edges are deduplicated per
//! `(from, to)` pair. Every edge endpoint is present in the node set:
//! unresolved references are rejected during analysis and never become
//! edges.

use crate::node::Node;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;

/// A directed graph of configuration nodes.
///
/// An edge `u → v` means `u` depends on `v`: some expression in `u`'s block
/// references `v`'s exported values.
#[derive(Default)]
pub struct Graph {
    nodes: IndexMap<String, Node>,
    edges: IndexSet<(String, String)>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_node(&mut self, node: Node) {
        self.nodes.insert(node.id().to_string(), node);
    }

    /// Record an edge; duplicates per `(from, to)` pair are dropped.
    pub(crate) fn add_edge(&mut self, from: &str, to: &str) {
        self.edges.insert((from.to_string(), to.to_string()));
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Edges as `(from, to)` id pairs, in discovery order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.edges.iter().map(|(f, t)| (f.as_str(), t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth-first cycle check with tri-color marking.
    ///
    /// Returns the first cycle found as a list of node ids in cycle order,
    /// with the entry node repeated at the end.
    pub fn detect_cycle(&self) -> Option<Vec<String>> {
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for (from, to) in self.edges() {
            adjacency.entry(from).or_default().push(to);
        }

        let mut color: HashMap<&str, Color> =
            self.nodes.keys().map(|id| (id.as_str(), Color::White)).collect();
        let mut stack = Vec::new();

        for id in self.nodes.keys() {
            if color[id.as_str()] == Color::White {
                if let Some(cycle) = visit(id, &adjacency, &mut color, &mut stack) {
                    return Some(cycle);
                }
            }
        }
        None
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

fn visit<'a>(
    id: &'a str,
    adjacency: &HashMap<&'a str, Vec<&'a str>>,
    color: &mut HashMap<&'a str, Color>,
    stack: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    color.insert(id, Color::Gray);
    stack.push(id);

    for &next in adjacency.get(id).into_iter().flatten() {
        match color[next] {
            Color::Gray => {
                // Back edge: the cycle is the stack suffix starting at `next`.
                let start = stack.iter().position(|&n| n == next).unwrap_or(0);
                let mut cycle: Vec<String> =
                    stack[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(next.to_string());
                return Some(cycle);
            }
            Color::White => {
                if let Some(cycle) = visit(next, adjacency, color, stack) {
                    return Some(cycle);
                }
            }
            Color::Black => {}
        }
    }

    stack.pop();
    color.insert(id, Color::Black);
    None
}
