//! Configuration graph loader for the beacon telemetry agent.
//!
//! The loader turns a parsed configuration document into an evaluable
//! dependency graph and keeps that graph alive across reloads:
//!
//! ```text
//! block statements → classified nodes → symbol table → dependency edges
//!                  → cycle check → published graph
//! ```
//!
//! On reload the new document is diffed against the running graph: a node
//! whose id and raw block body are unchanged keeps its runtime handle (and
//! with it the component's live state); nodes that disappeared are retired
//! through the collaborator's teardown contract after the new graph is
//! published.
//!
//! # Design
//!
//! - `stability` — feature stability levels and the minimum-stability gate
//! - `registry` — block name → component factory and metadata
//! - `node` — the closed node variant set (component, config, declare,
//!   foreach, service)
//! - `graph` — directed graph with cycle detection
//! - `loader` — the apply/diff/publish orchestration
//! - `collab` — contracts of the external collaborators the loader
//!   delegates to (runtime handles, metrics registerer, module
//!   controllers, services, update callbacks)
//!
//! Expression evaluation, live data flow and component execution are the
//! embedder's concern; the loader only discovers the edges that expressions
//! imply and hands the graph over.

pub mod collab;
mod deps;
pub mod graph;
pub mod loader;
pub mod node;
pub mod registry;
pub mod stability;

pub use collab::{
    ModuleController, ModuleControllerFactory, ModuleControllerOpts, NoopRegisterer,
    OnBlockNodeUpdate, Registerer, RuntimeHandle, ServiceDefinition,
};
pub use graph::Graph;
pub use loader::{ApplyOptions, ComponentGlobals, Loader, LoaderOptions};
pub use node::{ComponentNode, ConfigNode, DeclareNode, ForeachNode, Node, ServiceNode};
pub use registry::{BuildError, ComponentBuildContext, ComponentRegistration, Registry};
pub use stability::Stability;
