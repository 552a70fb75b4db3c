//! The loader: orchestrates a full apply.
//!
//! One `apply` runs the pipeline
//!
//! 1. inject default config blocks (`logging`, `tracing`)
//! 2. classify blocks into the symbol table (duplicate ids rejected with
//!    the prior declaration's position)
//! 3. gate stability and community features
//! 4. reuse runtime handles for unchanged blocks, build the rest
//! 5. link dependency edges
//! 6. validate (cycle check)
//! 7. publish atomically, then retire removed nodes
//!
//! Classification and gating keep going after an error so a single apply
//! surfaces as many problems as possible; publication only happens when no
//! error-severity diagnostic was recorded. On failure the previously
//! published graph stays current, except when a reference failed to
//! resolve: there the published graph is replaced by the empty graph until
//! a successful apply.
//!
//! The loader is single-threaded per instance: `apply` holds a write lock
//! for its whole duration and `graph()` takes a read lock, so concurrent
//! readers observe either the pre-apply or the post-apply snapshot, never a
//! half-updated state. Publication happens-before retirement: a
//! collaborator observing `teardown` of a handle can assume no later
//! `graph()` snapshot returns it.

use crate::collab::{
    ModuleControllerFactory, ModuleControllerOpts, OnBlockNodeUpdate, Registerer, RuntimeHandle,
    ServiceDefinition,
};
use crate::deps;
use crate::graph::Graph;
use crate::node::{
    config_block_takes_label, is_config_block_name, ComponentNode, ConfigNode, DeclareNode,
    ForeachNode, Node, ServiceNode,
};
use crate::registry::{ComponentBuildContext, Registry};
use crate::stability::{check_allowed, Stability};
use beacon_syntax::ast::{BlockStmt, ExprKind, Span, Stmt};
use beacon_syntax::diag::{Diagnostic, Diagnostics};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Shared environment handed to every apply.
pub struct ComponentGlobals {
    /// Directory components may persist data under.
    pub data_path: PathBuf,
    /// Minimum stability an apply accepts.
    pub min_stability: Stability,
    /// Allow community components; enabling this bypasses the stability
    /// gate for them.
    pub enable_community_comps: bool,
    /// Component factories.
    pub registry: Arc<Registry>,
    /// Metrics registration surface.
    pub registerer: Arc<dyn Registerer>,
    /// Module controller factory, invoked once per constructed component.
    pub new_module_controller: ModuleControllerFactory,
    /// Invoked after publication for each config block whose value changed.
    pub on_block_node_update: OnBlockNodeUpdate,
}

/// Options for constructing a [`Loader`].
pub struct LoaderOptions {
    pub globals: ComponentGlobals,
    /// Services the loader accepts blocks for.
    pub services: Vec<ServiceDefinition>,
}

/// One apply's worth of parsed input.
#[derive(Default)]
pub struct ApplyOptions {
    pub component_blocks: Vec<BlockStmt>,
    pub config_blocks: Vec<BlockStmt>,
    pub declare_blocks: Vec<BlockStmt>,
}

/// The configuration graph loader.
pub struct Loader {
    globals: ComponentGlobals,
    services: IndexMap<String, ServiceDefinition>,
    published: RwLock<Arc<Graph>>,
}

impl Loader {
    pub fn new(options: LoaderOptions) -> Self {
        let services = options
            .services
            .into_iter()
            .map(|def| (def.name.clone(), def))
            .collect();
        Self {
            globals: options.globals,
            services,
            published: RwLock::new(Arc::new(Graph::new())),
        }
    }

    /// Snapshot of the currently published graph.
    pub fn graph(&self) -> Arc<Graph> {
        Arc::clone(&self.published.read().expect("loader state lock poisoned"))
    }

    /// Reconcile the given blocks against the running graph.
    ///
    /// Returns all diagnostics produced by the apply. An empty (or
    /// warning-only) result means the new graph was published.
    pub fn apply(&self, options: ApplyOptions) -> Diagnostics {
        let mut published = self.published.write().expect("loader state lock poisoned");
        let previous = Arc::clone(&published);
        let mut diags = Diagnostics::new();

        // 1. Default config injection. `logging` and `tracing` are
        // implicitly present; re-injected on every apply so removing one
        // from the document keeps the graph shape stable.
        let mut config_blocks = options.config_blocks;
        for default in ["logging", "tracing"] {
            if !config_blocks.iter().any(|b| b.full_name() == default) {
                config_blocks.push(synthetic_block(default));
            }
        }

        // 2. Classify into the symbol table.
        let mut nodes: IndexMap<String, Node> = IndexMap::new();
        let all_blocks = options
            .declare_blocks
            .into_iter()
            .chain(config_blocks)
            .chain(options.component_blocks);
        for block in all_blocks {
            let Some(node) = self.classify_block(block, &mut diags) else {
                continue;
            };
            if let Some(existing) = nodes.get(node.id()) {
                diags.push(Diagnostic::error(
                    format!(
                        "block {} already declared at {}",
                        node.id(),
                        existing.declared_at()
                    ),
                    &node.block().span,
                ));
                continue;
            }
            nodes.insert(node.id().to_string(), node);
        }

        // 3. Gate stability and community features. Violating nodes stay
        // in the symbol table so references to them still resolve and the
        // apply reports one coherent set of problems; the graph is never
        // published on a gate violation.
        let mut gate_failed: HashSet<String> = HashSet::new();
        for (id, node) in &nodes {
            let result = match node {
                Node::Component(c) if c.community => {
                    if self.globals.enable_community_comps {
                        Ok(())
                    } else {
                        Err(format!(
                            "the component \"{}\" is a community component. Use the \
                             --feature.community-components.enabled command-line flag \
                             to enable community components",
                            c.name()
                        ))
                    }
                }
                Node::Component(c) => check_allowed(
                    self.globals.min_stability,
                    c.stability(),
                    &format!("component \"{}\"", c.name()),
                ),
                Node::Foreach(_) => check_allowed(
                    self.globals.min_stability,
                    ForeachNode::STABILITY,
                    "config block \"foreach\"",
                ),
                Node::Service(s) => check_allowed(
                    self.globals.min_stability,
                    s.stability(),
                    &format!("block \"{}\"", s.id()),
                ),
                Node::Config(_) | Node::Declare(_) => Ok(()),
            };
            if let Err(message) = result {
                diags.push(Diagnostic::error(message, &node.block().span));
                gate_failed.insert(id.clone());
            }
        }

        // 4. Reuse unchanged components, build the rest.
        let mut fresh: Vec<(String, Arc<dyn RuntimeHandle>)> = Vec::new();
        let mut replaced: Vec<Arc<dyn RuntimeHandle>> = Vec::new();
        let mut newly_registered: Vec<String> = Vec::new();
        let ids: Vec<String> = nodes.keys().cloned().collect();
        for id in &ids {
            let previous_component = match previous.get_by_id(id) {
                Some(Node::Component(old)) => Some(old),
                _ => None,
            };
            let Some(Node::Component(node)) = nodes.get_mut(id) else {
                continue;
            };

            if let Some(old) = previous_component {
                if old.block.same_content(&node.block) {
                    node.handle = old.handle.clone();
                    debug!(id = %id, "reusing existing component");
                    continue;
                }
            }
            if gate_failed.contains(id) {
                continue;
            }

            let registration = self
                .globals
                .registry
                .get(&node.name)
                .expect("classified component is registered");
            let module_controller =
                (self.globals.new_module_controller)(ModuleControllerOpts { id: id.clone() });
            let context = ComponentBuildContext {
                id,
                data_path: &self.globals.data_path,
                body: &node.block.body,
                registerer: &self.globals.registerer,
                module_controller,
            };
            match (registration.build)(context) {
                Ok(handle) => {
                    node.handle = Some(Arc::clone(&handle));
                    fresh.push((id.clone(), handle));
                    if let Some(old) = previous_component {
                        if let Some(old_handle) = &old.handle {
                            replaced.push(Arc::clone(old_handle));
                        }
                    } else {
                        self.globals.registerer.register_component(id);
                        newly_registered.push(id.clone());
                    }
                    debug!(id = %id, "built new component");
                }
                Err(err) => {
                    let span = node.block.span.clone();
                    diags.push(Diagnostic::error(err.to_string(), &span));
                }
            }
        }

        // 5. Link dependency edges.
        let analysis = deps::analyze(&nodes);
        let invalid_reference = analysis.invalid_reference;
        diags.merge(analysis.diags);
        for (target, source) in analysis.consumers {
            if let Some(Node::Component(target)) = nodes.get_mut(&target) {
                target.data_flow_consumers.push(source);
            }
        }

        let mut graph = Graph::new();
        for (_, node) in nodes {
            graph.add_node(node);
        }
        for (from, to) in &analysis.edges {
            graph.add_edge(from, to);
        }

        // 6. Validate.
        if let Some(cycle) = graph.detect_cycle() {
            let span = graph
                .get_by_id(&cycle[0])
                .map(|n| n.block().span.clone())
                .unwrap_or_else(Span::none);
            diags.push(Diagnostic::error(
                format!("circular dependency detected: {}", cycle.join(" -> ")),
                &span,
            ));
        }

        // 7. Publish or roll back; retirement strictly follows publication.
        if !diags.has_errors() {
            let new_graph = Arc::new(graph);
            *published = Arc::clone(&new_graph);

            for node in previous.nodes() {
                if new_graph.get_by_id(node.id()).is_some() {
                    continue;
                }
                if let Node::Component(old) = node {
                    if let Some(handle) = &old.handle {
                        handle.teardown();
                    }
                    self.globals.registerer.unregister_component(node.id());
                    debug!(id = %node.id(), "retired stale component");
                }
            }
            for handle in replaced {
                handle.teardown();
            }

            for node in new_graph.nodes() {
                let Node::Config(config) = node else {
                    continue;
                };
                let changed = match previous.get_by_id(config.id()) {
                    Some(Node::Config(old)) => !old.block.same_content(&config.block),
                    _ => true,
                };
                if changed {
                    (self.globals.on_block_node_update)(node);
                }
            }

            info!(
                nodes = new_graph.len(),
                edges = new_graph.edges().count(),
                "published new configuration graph"
            );
        } else if invalid_reference {
            // The documented behavior for an apply with unresolved
            // references: nothing is running until a good apply lands.
            *published = Arc::new(Graph::new());

            for (id, handle) in &fresh {
                handle.teardown();
                if newly_registered.contains(id) {
                    self.globals.registerer.unregister_component(id);
                }
            }
            for node in previous.nodes() {
                if let Node::Component(old) = node {
                    if let Some(handle) = &old.handle {
                        handle.teardown();
                    }
                    self.globals.registerer.unregister_component(node.id());
                }
            }

            warn!("apply failed with unresolved references; published graph reset to empty");
        } else {
            for (id, handle) in &fresh {
                handle.teardown();
                if newly_registered.contains(id) {
                    self.globals.registerer.unregister_component(id);
                }
            }
            warn!(
                diagnostics = diags.len(),
                "apply failed; previous graph left in place"
            );
        }

        diags
    }

    /// Route one block to its namespace and build the node for it.
    ///
    /// Returns `None` when the block is malformed or unknown; the problem
    /// is recorded and classification continues.
    fn classify_block(&self, block: BlockStmt, diags: &mut Diagnostics) -> Option<Node> {
        let name = block.full_name();
        if name == "declare" {
            return classify_declare(block, diags);
        }
        if name == "foreach" {
            return classify_foreach(block, diags);
        }
        if is_config_block_name(&name) {
            return classify_config(name, block, diags);
        }
        if let Some(def) = self.services.get(&name) {
            if let Some(decode) = &def.decode {
                if let Err(err) = decode(&block.body) {
                    diags.push(Diagnostic::error(err.to_string(), &block.span));
                    return None;
                }
            }
            return Some(Node::Service(ServiceNode {
                id: name,
                stability: def.stability,
                block,
            }));
        }

        let Some(registration) = self.globals.registry.get(&name) else {
            diags.push(Diagnostic::error(
                format!("cannot find the definition of component name \"{name}\""),
                &block.span,
            ));
            return None;
        };
        let label = match block.label.as_deref() {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => {
                diags.push(Diagnostic::error(
                    format!("component \"{name}\" must have a label"),
                    &block.span,
                ));
                return None;
            }
        };
        Some(Node::Component(ComponentNode {
            id: block.id(),
            name,
            label,
            stability: registration.stability,
            community: registration.community,
            block,
            handle: None,
            data_flow_consumers: Vec::new(),
        }))
    }
}

fn classify_config(name: String, block: BlockStmt, diags: &mut Diagnostics) -> Option<Node> {
    let has_label = matches!(block.label.as_deref(), Some(l) if !l.is_empty());
    if config_block_takes_label(&name) {
        if !has_label {
            diags.push(Diagnostic::error(
                format!("block \"{name}\" must have a label"),
                &block.span,
            ));
            return None;
        }
    } else if block.label.is_some() {
        diags.push(Diagnostic::error(
            format!("block \"{name}\" does not support specifying labels"),
            &block.span,
        ));
        return None;
    }
    Some(Node::Config(ConfigNode {
        id: block.id(),
        block,
    }))
}

fn classify_declare(block: BlockStmt, diags: &mut Diagnostics) -> Option<Node> {
    let label = match block.label.as_deref() {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => {
            diags.push(Diagnostic::error(
                "declare block must have a label",
                &block.span,
            ));
            return None;
        }
    };
    Some(Node::Declare(DeclareNode {
        id: format!("declare.{label}"),
        label,
        block,
    }))
}

fn classify_foreach(block: BlockStmt, diags: &mut Diagnostics) -> Option<Node> {
    let Some(label) = block.label.clone().filter(|l| !l.is_empty()) else {
        diags.push(Diagnostic::error(
            "foreach block must have a label",
            &block.span,
        ));
        return None;
    };
    let id = format!("foreach.{label}");

    let mut collection = None;
    let mut var = None;
    let mut template = None;
    for stmt in &block.body {
        match stmt {
            Stmt::Attribute(attr) if attr.name == "collection" => {
                collection = Some(attr.value.clone());
            }
            Stmt::Attribute(attr) if attr.name == "var" => match &attr.value.kind {
                ExprKind::String(value) => var = Some(value.clone()),
                _ => {
                    diags.push(Diagnostic::error(
                        format!("the var attribute of foreach block \"{id}\" must be a string"),
                        &attr.span,
                    ));
                    return None;
                }
            },
            Stmt::Block(nested) if nested.full_name() == "template" => {
                template = Some(nested.clone());
            }
            _ => {}
        }
    }

    let mut missing = |what: &str| {
        diags.push(Diagnostic::error(
            format!("foreach block \"{id}\" is missing required {what}"),
            &block.span,
        ));
    };
    if collection.is_none() {
        missing("attribute \"collection\"");
    }
    if var.is_none() {
        missing("attribute \"var\"");
    }
    if template.is_none() {
        missing("block \"template\"");
    }
    let (Some(collection), Some(var), Some(template)) = (collection, var, template) else {
        return None;
    };

    Some(Node::Foreach(ForeachNode {
        id,
        label,
        collection,
        var,
        template,
        block,
    }))
}

/// An empty, unlabelled block with no source position, for implicitly
/// present config blocks.
fn synthetic_block(name: &str) -> BlockStmt {
    BlockStmt {
        name: vec![name.to_string()],
        label: None,
        body: Vec::new(),
        span: Span::none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::NoopRegisterer;

    fn test_loader() -> Loader {
        Loader::new(LoaderOptions {
            globals: ComponentGlobals {
                data_path: PathBuf::from("/tmp/beacon-test"),
                min_stability: Stability::PublicPreview,
                enable_community_comps: false,
                registry: Arc::new(Registry::new()),
                registerer: Arc::new(NoopRegisterer),
                new_module_controller: Arc::new(|_| None),
                on_block_node_update: Arc::new(|_| {}),
            },
            services: Vec::new(),
        })
    }

    #[test]
    fn test_empty_apply_publishes_default_config_blocks() {
        let loader = test_loader();
        let diags = loader.apply(ApplyOptions::default());
        assert!(!diags.has_errors(), "unexpected diagnostics: {diags}");

        let graph = loader.graph();
        let mut ids: Vec<_> = graph.node_ids().collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["logging", "tracing"]);
        assert_eq!(graph.edges().count(), 0);
    }

    #[test]
    fn test_graph_starts_empty() {
        let loader = test_loader();
        assert!(loader.graph().is_empty());
    }
}
