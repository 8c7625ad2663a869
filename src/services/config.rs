//! `/load/config`: front-end configuration from the `[web]` table.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::handlers::{ApiContext, Service, ServiceError, ServiceFactory, ServiceResult};

#[derive(Debug)]
pub struct WebConfigService {
    config: Value,
}

impl WebConfigService {
    pub fn new(web: &toml::Table) -> Result<Self, ServiceError> {
        let config = serde_json::to_value(web)
            .map_err(|e| ServiceError::with_source("cannot convert [web] config", e))?;
        Ok(Self { config })
    }
}

#[async_trait]
impl Service for WebConfigService {
    async fn call(&self, _ctx: ApiContext<'_>) -> Result<ServiceResult, ServiceError> {
        Ok(ServiceResult::response(self.config.clone()))
    }
}

#[derive(Debug, Clone)]
pub struct WebConfigFactory {
    service: Arc<WebConfigService>,
}

impl WebConfigFactory {
    pub fn new(web: &toml::Table) -> Result<Self, ServiceError> {
        Ok(Self {
            service: Arc::new(WebConfigService::new(web)?),
        })
    }
}

impl ServiceFactory for WebConfigFactory {
    fn route(&self) -> String {
        "/load/config".to_string()
    }

    fn create_service(&self) -> Arc<dyn Service> {
        self.service.clone()
    }
}
