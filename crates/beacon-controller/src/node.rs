//! The node set: typed constructors for everything that can appear in the
//! configuration graph.
//!
//! Nodes form a closed variant with an explicit discriminant, not open
//! virtual dispatch, so the reload diff can pattern-match by kind. All
//! variants share `{id, block, declared position}`; component nodes
//! additionally own a runtime handle and the list of their data-flow
//! consumers.

use crate::collab::RuntimeHandle;
use crate::stability::Stability;
use beacon_syntax::ast::{BlockStmt, Expr, Position};
use std::fmt;
use std::sync::Arc;

/// A node in the configuration graph.
pub enum Node {
    Component(ComponentNode),
    Config(ConfigNode),
    Declare(DeclareNode),
    Foreach(ForeachNode),
    Service(ServiceNode),
}

impl Node {
    /// Fully-qualified node id, unique across all namespaces.
    pub fn id(&self) -> &str {
        match self {
            Node::Component(n) => &n.id,
            Node::Config(n) => &n.id,
            Node::Declare(n) => &n.id,
            Node::Foreach(n) => &n.id,
            Node::Service(n) => &n.id,
        }
    }

    /// The raw block this node was built from.
    pub fn block(&self) -> &BlockStmt {
        match self {
            Node::Component(n) => &n.block,
            Node::Config(n) => &n.block,
            Node::Declare(n) => &n.block,
            Node::Foreach(n) => &n.block,
            Node::Service(n) => &n.block,
        }
    }

    /// Start position of the declaring block.
    pub fn declared_at(&self) -> &Position {
        &self.block().span.start
    }

    pub fn as_component(&self) -> Option<&ComponentNode> {
        match self {
            Node::Component(n) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Node::Component(_) => "Component",
            Node::Config(_) => "Config",
            Node::Declare(_) => "Declare",
            Node::Foreach(_) => "Foreach",
            Node::Service(_) => "Service",
        };
        write!(f, "{kind}({})", self.id())
    }
}

/// A component backed by a registered factory.
pub struct ComponentNode {
    pub(crate) id: String,
    /// Registry name (`pkg.kind`), without the label.
    pub(crate) name: String,
    pub(crate) label: String,
    pub(crate) stability: Stability,
    pub(crate) community: bool,
    pub(crate) block: BlockStmt,
    /// Live state owned by the collaborator. `None` only when the factory
    /// failed, which also fails the apply.
    pub(crate) handle: Option<Arc<dyn RuntimeHandle>>,
    /// Ids of nodes that consume this node's outputs, one entry per
    /// reference occurrence, rebuilt from scratch on every apply.
    pub(crate) data_flow_consumers: Vec<String>,
}

impl ComponentNode {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn stability(&self) -> Stability {
        self.stability
    }

    pub fn community(&self) -> bool {
        self.community
    }

    pub fn handle(&self) -> Option<&Arc<dyn RuntimeHandle>> {
        self.handle.as_ref()
    }

    /// Node ids that depend on this node's outputs via data expressions,
    /// in analyzer-encounter order. An expression referencing this node
    /// twice contributes two entries.
    pub fn data_flow_edges_to(&self) -> &[String] {
        &self.data_flow_consumers
    }
}

/// A singleton config block (`logging`, `tracing`, `argument`, ...).
pub struct ConfigNode {
    pub(crate) id: String,
    pub(crate) block: BlockStmt,
}

impl ConfigNode {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn block(&self) -> &BlockStmt {
        &self.block
    }
}

/// A reusable component template, `declare "name" { ... }`.
pub struct DeclareNode {
    pub(crate) id: String,
    pub(crate) label: String,
    pub(crate) block: BlockStmt,
}

impl DeclareNode {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// A `foreach "name" { collection = ...; var = "..."; template { ... } }`
/// block, stamping its template once per collection element.
///
/// Foreach is gated like a component at [`ForeachNode::STABILITY`]. The
/// community flag is intentionally not consulted for foreach blocks.
pub struct ForeachNode {
    pub(crate) id: String,
    pub(crate) label: String,
    pub(crate) collection: Expr,
    pub(crate) var: String,
    pub(crate) template: BlockStmt,
    pub(crate) block: BlockStmt,
}

impl ForeachNode {
    /// Declared stability of the foreach feature.
    pub const STABILITY: Stability = Stability::Experimental;

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn collection(&self) -> &Expr {
        &self.collection
    }

    pub fn var(&self) -> &str {
        &self.var
    }

    pub fn template(&self) -> &BlockStmt {
        &self.template
    }
}

/// A service block; the definition (and its stability) comes from the
/// loader's service list.
pub struct ServiceNode {
    pub(crate) id: String,
    pub(crate) stability: Stability,
    pub(crate) block: BlockStmt,
}

impl ServiceNode {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn stability(&self) -> Stability {
        self.stability
    }
}

/// True if `name` is one of the fixed config-block names.
pub(crate) fn is_config_block_name(name: &str) -> bool {
    matches!(
        name,
        "logging" | "tracing" | "argument" | "export" | "remotecfg"
    ) || name.starts_with("import.")
}

/// True if the config block named `name` takes a label.
pub(crate) fn config_block_takes_label(name: &str) -> bool {
    matches!(name, "argument" | "export") || name.starts_with("import.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_block_names() {
        assert!(is_config_block_name("logging"));
        assert!(is_config_block_name("tracing"));
        assert!(is_config_block_name("import.file"));
        assert!(!is_config_block_name("tick"));
    }

    #[test]
    fn test_config_block_labels() {
        assert!(config_block_takes_label("argument"));
        assert!(config_block_takes_label("export"));
        assert!(config_block_takes_label("import.http"));
        assert!(!config_block_takes_label("logging"));
        assert!(!config_block_takes_label("remotecfg"));
    }
}
