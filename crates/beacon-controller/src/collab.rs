//! Contracts of the loader's external collaborators.
//!
//! The loader constructs and diffs the configuration graph; everything that
//! actually *runs* (component workers, metrics, modules, services) is
//! owned by collaborators behind the traits in this module. The loader
//! holds opaque handles and is forbidden from mutating them.

use crate::registry::BuildError;
use crate::stability::Stability;
use beacon_syntax::ast::Stmt;
use std::sync::Arc;

/// Opaque live execution state of a component, owned by the embedder.
///
/// Handle identity is `Arc` pointer identity: a node whose id and raw block
/// body survive a reload keeps the same handle.
pub trait RuntimeHandle: Send + Sync {
    /// Release the resources owned by this handle.
    ///
    /// Called at most once, after the handle is no longer reachable from
    /// the published graph.
    fn teardown(&self);
}

/// Metrics registration surface.
///
/// The loader registers a component id when its node is first constructed
/// and unregisters it when the id is retired. A reused node keeps its
/// metrics identity: no re-registration happens on reload.
pub trait Registerer: Send + Sync {
    fn register_component(&self, id: &str);
    fn unregister_component(&self, id: &str);
}

/// Registerer that drops all registrations.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRegisterer;

impl Registerer for NoopRegisterer {
    fn register_component(&self, _id: &str) {}

    fn unregister_component(&self, _id: &str) {}
}

/// Controller for the modules a component may load.
pub trait ModuleController: Send + Sync {
    /// Ids of the modules currently managed by this controller.
    fn module_ids(&self) -> Vec<String>;
}

/// Options handed to the module-controller factory, one per constructed
/// component.
#[derive(Debug, Clone)]
pub struct ModuleControllerOpts {
    /// Id of the component the controller is created for.
    pub id: String,
}

/// Factory for module controllers.
///
/// May return `None`, in which case the loader tolerates missing modules
/// silently; component body errors still surface.
pub type ModuleControllerFactory =
    Arc<dyn Fn(ModuleControllerOpts) -> Option<Arc<dyn ModuleController>> + Send + Sync>;

/// Callback invoked after a successful publication for every config-block
/// node whose body changed relative to the previously published graph,
/// including its first appearance.
pub type OnBlockNodeUpdate = Arc<dyn Fn(&crate::node::Node) + Send + Sync>;

/// Decoder for a service block's body. Owned by the service collaborator.
pub type ServiceConfigDecoder = Arc<dyn Fn(&[Stmt]) -> Result<(), BuildError> + Send + Sync>;

/// Definition of a service the loader accepts blocks for.
#[derive(Clone)]
pub struct ServiceDefinition {
    /// Service name; doubles as the block name and the node id.
    pub name: String,
    /// Declared stability, gated like any other feature.
    pub stability: Stability,
    /// Decodes the service block body. `None` accepts any body.
    pub decode: Option<ServiceConfigDecoder>,
}
