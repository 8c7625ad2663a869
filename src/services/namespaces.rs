//! `/load/namespaces`: where each plugin's sources are served from.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::handlers::{ApiContext, Service, ServiceError, ServiceFactory, ServiceResult};
use crate::plugin::PluginRegistry;

/// Maps every plugin name to `{"path": "/src/<name>"}`.
#[derive(Debug)]
pub struct NamespacesService {
    namespaces: Value,
}

impl NamespacesService {
    pub fn new(plugins: &PluginRegistry) -> Self {
        let mut map = Map::new();
        for plugin in plugins.items() {
            let mut entry = Map::new();
            entry.insert("path".into(), Value::String(format!("/src/{}", plugin.name)));
            map.insert(plugin.name.clone(), Value::Object(entry));
        }
        Self {
            namespaces: Value::Object(map),
        }
    }
}

#[async_trait]
impl Service for NamespacesService {
    async fn call(&self, _ctx: ApiContext<'_>) -> Result<ServiceResult, ServiceError> {
        Ok(ServiceResult::response(self.namespaces.clone()))
    }
}

#[derive(Debug, Clone)]
pub struct NamespacesFactory {
    service: Arc<NamespacesService>,
}

impl NamespacesFactory {
    pub fn new(plugins: &PluginRegistry) -> Self {
        Self {
            service: Arc::new(NamespacesService::new(plugins)),
        }
    }
}

impl ServiceFactory for NamespacesFactory {
    fn route(&self) -> String {
        "/load/namespaces".to_string()
    }

    fn create_service(&self) -> Arc<dyn Service> {
        self.service.clone()
    }
}
