//! Shared fixtures for loader integration tests: a small set of test
//! components (tick, passthrough, summation, community) and collaborators
//! that record every call they receive.

use beacon_controller::{
    ApplyOptions, BuildError, ComponentGlobals, ComponentRegistration, Graph, Loader,
    LoaderOptions, Registerer, Registry, RuntimeHandle, ServiceDefinition, Stability,
};
use beacon_syntax::ast::Stmt;
use beacon_syntax::diag::Diagnostics;
use beacon_syntax::parse_blocks;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Runtime handle that records its teardown in the shared env.
pub struct TestHandle {
    id: String,
    torn_down: Arc<Mutex<Vec<String>>>,
}

impl RuntimeHandle for TestHandle {
    fn teardown(&self) {
        self.torn_down.lock().unwrap().push(self.id.clone());
    }
}

struct RecordingRegisterer {
    registered: Arc<Mutex<Vec<String>>>,
    unregistered: Arc<Mutex<Vec<String>>>,
}

impl Registerer for RecordingRegisterer {
    fn register_component(&self, id: &str) {
        self.registered.lock().unwrap().push(id.to_string());
    }

    fn unregister_component(&self, id: &str) {
        self.unregistered.lock().unwrap().push(id.to_string());
    }
}

/// Recording collaborators shared by every loader a test constructs.
pub struct TestEnv {
    pub created: Arc<Mutex<Vec<String>>>,
    pub torn_down: Arc<Mutex<Vec<String>>>,
    pub registered: Arc<Mutex<Vec<String>>>,
    pub unregistered: Arc<Mutex<Vec<String>>>,
    pub config_updates: Arc<Mutex<Vec<String>>>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            created: Arc::default(),
            torn_down: Arc::default(),
            registered: Arc::default(),
            unregistered: Arc::default(),
            config_updates: Arc::default(),
        }
    }

    /// A loader over the test component registry.
    pub fn loader(&self, min_stability: Stability) -> Loader {
        self.loader_with(min_stability, false, Vec::new())
    }

    pub fn loader_with(
        &self,
        min_stability: Stability,
        enable_community_comps: bool,
        services: Vec<ServiceDefinition>,
    ) -> Loader {
        let mut registry = Registry::new();
        for (name, community, allowed) in [
            ("tick", false, &["frequency"] as &'static [&'static str]),
            ("passthrough", false, &["input", "lag"]),
            ("summation", false, &["input"]),
            ("community", true, &[]),
        ] {
            registry
                .register(self.component(name, community, allowed))
                .unwrap();
        }

        let config_updates = Arc::clone(&self.config_updates);
        Loader::new(LoaderOptions {
            globals: ComponentGlobals {
                data_path: PathBuf::from("/tmp/beacon-test"),
                min_stability,
                enable_community_comps,
                registry: Arc::new(registry),
                registerer: Arc::new(RecordingRegisterer {
                    registered: Arc::clone(&self.registered),
                    unregistered: Arc::clone(&self.unregistered),
                }),
                new_module_controller: Arc::new(|_| None),
                on_block_node_update: Arc::new(move |node| {
                    config_updates.lock().unwrap().push(node.id().to_string());
                }),
            },
            services,
        })
    }

    fn component(
        &self,
        name: &str,
        community: bool,
        allowed: &'static [&'static str],
    ) -> ComponentRegistration {
        let created = Arc::clone(&self.created);
        let torn_down = Arc::clone(&self.torn_down);
        ComponentRegistration {
            name: name.to_string(),
            stability: Stability::PublicPreview,
            community,
            build: Arc::new(move |ctx| {
                for stmt in ctx.body {
                    if let Stmt::Attribute(attr) = stmt {
                        if !allowed.contains(&attr.name.as_str()) {
                            return Err(BuildError::UnrecognizedAttribute(attr.name.clone()));
                        }
                    }
                }
                created.lock().unwrap().push(ctx.id.to_string());
                Ok(Arc::new(TestHandle {
                    id: ctx.id.to_string(),
                    torn_down: Arc::clone(&torn_down),
                }) as Arc<dyn RuntimeHandle>)
            }),
        }
    }
}

/// Parse the three sources and run one apply, mirroring how the agent
/// feeds the loader. Parse errors abort before the apply, like the real
/// caller does.
pub fn apply_from_content(
    loader: &Loader,
    components: &str,
    config: &str,
    declares: &str,
) -> Diagnostics {
    let mut options = ApplyOptions::default();

    let (blocks, diags) = parse_blocks("test", components);
    if diags.has_errors() {
        return diags;
    }
    options.component_blocks = blocks;

    if !config.is_empty() {
        let (blocks, diags) = parse_blocks("test", config);
        if diags.has_errors() {
            return diags;
        }
        options.config_blocks = blocks;
    }

    if !declares.is_empty() {
        let (blocks, diags) = parse_blocks("test", declares);
        if diags.has_errors() {
            return diags;
        }
        options.declare_blocks = blocks;
    }

    loader.apply(options)
}

/// Assert the graph's node and edge sets, order-insensitively.
pub fn assert_graph(graph: &Graph, nodes: &[&str], edges: &[(&str, &str)]) {
    let mut actual_nodes: Vec<&str> = graph.node_ids().collect();
    actual_nodes.sort_unstable();
    let mut expected_nodes = nodes.to_vec();
    expected_nodes.sort_unstable();
    assert_eq!(actual_nodes, expected_nodes, "list of nodes does not match");

    let mut actual_edges: Vec<(&str, &str)> = graph.edges().collect();
    actual_edges.sort_unstable();
    let mut expected_edges = edges.to_vec();
    expected_edges.sort_unstable();
    assert_eq!(actual_edges, expected_edges, "list of edges does not match");
}

/// The component node for `id`, panicking when absent or of another kind.
pub fn component<'a>(graph: &'a Graph, id: &str) -> &'a beacon_controller::ComponentNode {
    graph
        .get_by_id(id)
        .unwrap_or_else(|| panic!("node {id} not found"))
        .as_component()
        .unwrap_or_else(|| panic!("node {id} is not a component"))
}
