//! Component resolution.
//!
//! The [`Resolver`] trait is the seam to whatever supplies handler and service
//! factories by id. [`Container`] is the in-memory implementation used by the
//! binary and the tests.

use std::collections::HashMap;
use std::sync::Arc;

use crate::dispatch::HandlerFactory;
use crate::handlers::ServiceFactory;

/// Failure to materialise a component. Always fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("unknown component '{0}'")]
    Unknown(String),
}

/// Resolves declared component ids to live factories.
pub trait Resolver: Send + Sync {
    fn resolve_handler(&self, id: &str) -> Result<Arc<dyn HandlerFactory>, ResolveError>;

    fn resolve_service(&self, id: &str) -> Result<Arc<dyn ServiceFactory>, ResolveError>;
}

/// Id → factory maps filled before the server starts.
#[derive(Default, Clone)]
pub struct Container {
    handlers: HashMap<String, Arc<dyn HandlerFactory>>,
    services: HashMap<String, Arc<dyn ServiceFactory>>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler factory (builder pattern).
    pub fn with_handler(mut self, id: impl Into<String>, factory: Arc<dyn HandlerFactory>) -> Self {
        self.register_handler(id, factory);
        self
    }

    /// Register a service factory (builder pattern).
    pub fn with_service(mut self, id: impl Into<String>, factory: Arc<dyn ServiceFactory>) -> Self {
        self.register_service(id, factory);
        self
    }

    pub fn register_handler(&mut self, id: impl Into<String>, factory: Arc<dyn HandlerFactory>) {
        let id = id.into();
        if self.handlers.insert(id.clone(), factory).is_some() {
            tracing::warn!(id = %id, "Handler factory replaced");
        }
    }

    pub fn register_service(&mut self, id: impl Into<String>, factory: Arc<dyn ServiceFactory>) {
        let id = id.into();
        if self.services.insert(id.clone(), factory).is_some() {
            tracing::warn!(id = %id, "Service factory replaced");
        }
    }
}

impl Resolver for Container {
    fn resolve_handler(&self, id: &str) -> Result<Arc<dyn HandlerFactory>, ResolveError> {
        self.handlers
            .get(id)
            .cloned()
            .ok_or_else(|| ResolveError::Unknown(id.to_string()))
    }

    fn resolve_service(&self, id: &str) -> Result<Arc<dyn ServiceFactory>, ResolveError> {
        self.services
            .get(id)
            .cloned()
            .ok_or_else(|| ResolveError::Unknown(id.to_string()))
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("services", &self.services.keys().collect::<Vec<_>>())
            .finish()
    }
}
