//! Startup orchestration.
//!
//! # Responsibilities
//! - Assemble the plugin set (built-in `http2` plugin first, then configured plugins)
//! - Register built-in factories in the container
//! - Build the handler chain and the dispatcher
//! - Bind the listener (or TLS) and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when the chain is ready)

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::{ConfigError, ServerConfig};
use crate::dispatch::{BuildEnv, Dispatcher, HandlerChain, InitError};
use crate::handlers::{ApiHandlerFactory, ServiceError, StaticHandlerFactory};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::net::{tls, Listener, ListenerError};
use crate::plugin::{Container, HandlerDescriptor, PluginDescriptor, PluginRegistry, Resolver};
use crate::routing::RealmRegistry;
use crate::services::{
    NamespacesFactory, WebConfigFactory, API_HANDLER_ID, API_HANDLER_WEIGHT, CONFIG_SERVICE_ID,
    HTTP2_REALM, NAMESPACES_SERVICE_ID, STATIC_HANDLER_ID, STATIC_HANDLER_WEIGHT,
};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build handler chain")]
    Init(#[from] InitError),
    #[error("failed to create built-in service")]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Listener(#[from] ListenerError),
    #[error("invalid bind address '{0}'")]
    Address(String),
    #[error("failed to load TLS certificates")]
    Tls(#[source] std::io::Error),
    #[error("server failed")]
    Server(#[source] std::io::Error),
}

/// Descriptor of the plugin shipped with the server.
///
/// Owns the `http2` realm, mounts the namespaces/config services, and installs
/// the API (weight 100) and static (weight 0) handlers. Its folders are the
/// project root's `src` and `web`.
pub fn builtin_plugin() -> PluginDescriptor {
    let mut plugin = PluginDescriptor::new(HTTP2_REALM, "");
    plugin.realm = Some(HTTP2_REALM.to_string());
    plugin.services = vec![
        NAMESPACES_SERVICE_ID.to_string(),
        CONFIG_SERVICE_ID.to_string(),
    ];
    plugin.handlers = vec![
        HandlerDescriptor::new(API_HANDLER_ID, API_HANDLER_WEIGHT),
        HandlerDescriptor::new(STATIC_HANDLER_ID, STATIC_HANDLER_WEIGHT),
    ];
    plugin
}

/// Built-in plugin followed by the configured ones, in file order.
pub fn plugin_registry(config: &ServerConfig) -> PluginRegistry {
    let mut items = Vec::with_capacity(config.plugins.len() + 1);
    items.push(builtin_plugin());
    items.extend(config.plugins.iter().cloned());
    PluginRegistry::new(items)
}

/// Container holding every built-in handler and service factory.
pub fn builtin_container(
    config: &ServerConfig,
    plugins: &PluginRegistry,
) -> Result<Container, StartupError> {
    Ok(Container::new()
        .with_handler(API_HANDLER_ID, Arc::new(ApiHandlerFactory))
        .with_handler(STATIC_HANDLER_ID, Arc::new(StaticHandlerFactory))
        .with_service(NAMESPACES_SERVICE_ID, Arc::new(NamespacesFactory::new(plugins)))
        .with_service(CONFIG_SERVICE_ID, Arc::new(WebConfigFactory::new(&config.web)?)))
}

/// Resolve and order every declared handler.
pub async fn build_dispatcher(
    config: &ServerConfig,
    plugins: &PluginRegistry,
    resolver: &dyn Resolver,
) -> Result<Dispatcher, InitError> {
    let realms = Arc::new(RealmRegistry::from_plugins(plugins));
    tracing::debug!(realms = ?realms.realms(), plugins = plugins.len(), "Building handler chain");
    let env = BuildEnv {
        plugins,
        realms: &realms,
        resolver,
        paths: &config.paths,
    };
    let chain = HandlerChain::build(&env).await?;
    Ok(Dispatcher::new(chain))
}

/// A configured, ready-to-serve server.
pub struct Application {
    config: ServerConfig,
    plugins: PluginRegistry,
    dispatcher: Arc<Dispatcher>,
}

impl Application {
    /// Build with the built-in container.
    pub async fn build(config: ServerConfig) -> Result<Self, StartupError> {
        let plugins = plugin_registry(&config);
        let container = builtin_container(&config, &plugins)?;
        Self::build_with(config, plugins, &container).await
    }

    /// Build with an explicit plugin set and resolver.
    pub async fn build_with(
        config: ServerConfig,
        plugins: PluginRegistry,
        resolver: &dyn Resolver,
    ) -> Result<Self, StartupError> {
        let dispatcher = build_dispatcher(&config, &plugins, resolver).await?;
        tracing::info!(
            plugins = plugins.len(),
            handlers = dispatcher.chain().len(),
            "Application ready"
        );
        Ok(Self {
            config,
            plugins,
            dispatcher: Arc::new(dispatcher),
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        self.dispatcher.clone()
    }

    pub fn into_server(self) -> HttpServer {
        HttpServer::new(self.dispatcher, self.config)
    }

    /// Bind as configured and serve until `shutdown` fires.
    pub async fn serve(self, shutdown: ShutdownSignal) -> Result<(), StartupError> {
        match self.config.listener.tls.clone() {
            Some(tls_config) => {
                let addr: SocketAddr = self
                    .config
                    .listener
                    .bind_address
                    .parse()
                    .map_err(|_| StartupError::Address(self.config.listener.bind_address.clone()))?;
                let tls = tls::load_tls_config(&tls_config, &self.config.paths.root)
                    .await
                    .map_err(StartupError::Tls)?;
                self.into_server()
                    .run_tls(addr, tls, shutdown)
                    .await
                    .map_err(StartupError::Server)
            }
            None => {
                let listener = Listener::bind(&self.config.listener).await?;
                self.serve_on(listener, shutdown).await
            }
        }
    }

    /// Serve plain TCP on an already bound listener.
    pub async fn serve_on(
        self,
        listener: Listener,
        shutdown: ShutdownSignal,
    ) -> Result<(), StartupError> {
        self.into_server()
            .run(listener, shutdown)
            .await
            .map_err(StartupError::Server)
    }
}
