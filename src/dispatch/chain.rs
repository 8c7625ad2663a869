//! Handler contracts and chain construction.
//!
//! # Responsibilities
//! - Define what a request handler and its factory look like
//! - Resolve every declared handler descriptor through the container
//! - Order the resolved handlers by descending weight
//! - Run a request context through the chain until a handler completes it
//!
//! # Design Decisions
//! - Built once at startup, immutable afterwards (shared via Arc, no locks)
//! - Stable sort: equal weights keep discovery order
//! - `before`/`after` hints are carried on descriptors but do not affect order
//! - Any factory that fails to resolve or construct aborts startup

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::PathsConfig;
use crate::dispatch::context::RequestContext;
use crate::dispatch::report::{Report, ResponseDraft};
use crate::handlers::ServiceError;
use crate::http::request::BoxError;
use crate::plugin::{PluginRegistry, ResolveError, Resolver};
use crate::routing::RealmRegistry;

/// Failure inside a handler. Surfaces as a 500 response.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("service failed: {0}")]
    Service(#[from] ServiceError),
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: BoxError,
    },
}

/// Failure while constructing a handler. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("handler '{id}' could not be created: {reason}")]
    Create { id: String, reason: String },
}

/// Processes a request or declines it.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    async fn handle(&self, ctx: &RequestContext) -> Result<Report, HandlerError>;
}

/// Creates a handler once the plugin set is known.
#[async_trait]
pub trait HandlerFactory: Send + Sync {
    async fn create_handler(&self, env: &BuildEnv<'_>) -> Result<Arc<dyn Handler>, InitError>;
}

/// What factories may consult while building their handler.
pub struct BuildEnv<'a> {
    pub plugins: &'a PluginRegistry,
    pub realms: &'a Arc<RealmRegistry>,
    pub resolver: &'a dyn Resolver,
    pub paths: &'a PathsConfig,
}

/// One resolved chain element.
#[derive(Clone)]
pub struct ChainEntry {
    pub id: String,
    pub weight: i32,
    pub handler: Arc<dyn Handler>,
}

impl std::fmt::Debug for ChainEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainEntry")
            .field("id", &self.id)
            .field("weight", &self.weight)
            .field("handler", &self.handler.name())
            .finish()
    }
}

/// Ordered handlers, highest weight first.
#[derive(Debug, Clone, Default)]
pub struct HandlerChain {
    entries: Vec<ChainEntry>,
}

impl HandlerChain {
    /// Order `entries` by descending weight, keeping the given order for ties.
    pub fn new(mut entries: Vec<ChainEntry>) -> Self {
        entries.sort_by(|a, b| b.weight.cmp(&a.weight));
        Self { entries }
    }

    /// Resolve and instantiate every handler the plugins declare.
    pub async fn build(env: &BuildEnv<'_>) -> Result<Self, InitError> {
        let mut entries = Vec::new();
        for desc in env.plugins.handler_descriptors() {
            if desc.has_ordering_hints() {
                tracing::warn!(
                    id = %desc.factory_id,
                    before = ?desc.before,
                    after = ?desc.after,
                    "Handler ordering hints are ignored; only weight is used"
                );
            }
            let factory = env.resolver.resolve_handler(&desc.factory_id)?;
            let handler = factory.create_handler(env).await?;
            tracing::debug!(
                id = %desc.factory_id,
                handler = handler.name(),
                weight = desc.weight,
                "Request handler created"
            );
            entries.push(ChainEntry {
                id: desc.factory_id.clone(),
                weight: desc.weight,
                handler,
            });
        }
        let chain = Self::new(entries);
        tracing::info!(handlers = ?chain.ids().collect::<Vec<_>>(), "Handler chain built");
        Ok(chain)
    }

    pub fn entries(&self) -> &[ChainEntry] {
        &self.entries
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run handlers in order, merging each report, until one completes.
    pub async fn run(&self, ctx: &mut RequestContext) -> Result<ResponseDraft, ChainError> {
        let mut draft = ResponseDraft::default();
        for entry in &self.entries {
            let report = entry
                .handler
                .handle(ctx)
                .await
                .map_err(|source| ChainError {
                    handler: entry.handler.name().to_string(),
                    source,
                })?;
            let complete = report.complete;
            let shared = draft.merge(report);
            ctx.shared.extend(shared);
            if complete {
                tracing::trace!(handler = entry.handler.name(), "Request completed");
                break;
            }
        }
        Ok(draft)
    }
}

/// A handler failed while the chain was running.
#[derive(Debug, thiserror::Error)]
#[error("handler '{handler}' failed")]
pub struct ChainError {
    pub handler: String,
    #[source]
    pub source: HandlerError,
}
