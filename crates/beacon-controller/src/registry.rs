//! Component registry: block name → factory and metadata.
//!
//! The registry is assembled once at process start and read-only
//! afterwards. Component factories decode their own block bodies; the
//! loader never interprets component attributes, it only surfaces factory
//! failures as diagnostics.

use crate::collab::{ModuleController, Registerer, RuntimeHandle};
use crate::stability::Stability;
use beacon_syntax::ast::Stmt;
use indexmap::IndexMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Error produced by a component factory while decoding its block body or
/// constructing runtime state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("unrecognized attribute name {0:?}")]
    UnrecognizedAttribute(String),
    #[error("missing required attribute {0:?}")]
    MissingAttribute(String),
    #[error("{0}")]
    Message(String),
}

impl BuildError {
    pub fn msg(message: impl Into<String>) -> Self {
        BuildError::Message(message.into())
    }
}

/// Everything a component factory gets to work with.
pub struct ComponentBuildContext<'a> {
    /// Fully-qualified node id, e.g. `tick.ticker`.
    pub id: &'a str,
    /// Directory the component may persist data under.
    pub data_path: &'a Path,
    /// Raw block body; the factory decodes its own attributes.
    pub body: &'a [Stmt],
    /// Metrics registration surface.
    pub registerer: &'a Arc<dyn Registerer>,
    /// Module controller for this component, when the factory provides one.
    pub module_controller: Option<Arc<dyn ModuleController>>,
}

/// Component factory: decodes the body and constructs live state.
pub type ComponentBuilder = Arc<
    dyn Fn(ComponentBuildContext<'_>) -> Result<Arc<dyn RuntimeHandle>, BuildError>
        + Send
        + Sync,
>;

/// A registered component kind.
#[derive(Clone)]
pub struct ComponentRegistration {
    /// Dotted block name, e.g. `pkg.kind`.
    pub name: String,
    /// Declared stability.
    pub stability: Stability,
    /// True for community-maintained components, which are gated by the
    /// community flag instead of the stability minimum.
    pub community: bool,
    pub build: ComponentBuilder,
}

/// Error returned when registering a name twice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("component {0:?} is already registered")]
pub struct AlreadyRegistered(pub String);

/// The static mapping from block name to component registration.
#[derive(Default)]
pub struct Registry {
    components: IndexMap<String, ComponentRegistration>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        registration: ComponentRegistration,
    ) -> Result<(), AlreadyRegistered> {
        if self.components.contains_key(&registration.name) {
            return Err(AlreadyRegistered(registration.name.clone()));
        }
        self.components
            .insert(registration.name.clone(), registration);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ComponentRegistration> {
        self.components.get(name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }
}
