//! API service handler.
//!
//! # Responsibilities
//! - Build the `/{realm}{route}` → service table from plugin descriptors
//! - Match requests in the `api` zone by exact route
//! - Pre-parse the body when the service has a parser (400 on failure)
//! - Wrap service responses as `{"data": ...}` JSON
//!
//! # Design Decisions
//! - Exact string lookup, no patterns
//! - Colliding routes: the last registered service wins (logged)
//! - A service without a response declines so later handlers can run

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use serde_json::json;

use crate::dispatch::{
    BuildEnv, Handler, HandlerError, HandlerFactory, InitError, Report, ReportBody,
    RequestContext, RequestHeaders,
};
use crate::handlers::service::{ApiContext, InputParser, Service};
use crate::http::response::ErrorBody;
use crate::routing::{RealmRegistry, Zone};

const APPLICATION_JSON: &str = "application/json";

/// Parser and service registered under one route.
#[derive(Clone)]
pub struct RouteEntry {
    pub parser: Option<Arc<dyn InputParser>>,
    pub service: Arc<dyn Service>,
}

/// Runs API services registered by plugins.
pub struct ApiServiceHandler {
    realms: Arc<RealmRegistry>,
    routes: HashMap<String, RouteEntry>,
}

impl ApiServiceHandler {
    pub fn new(realms: Arc<RealmRegistry>, routes: HashMap<String, RouteEntry>) -> Self {
        Self { realms, routes }
    }

    /// Registered routes, unordered.
    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }
}

#[async_trait]
impl Handler for ApiServiceHandler {
    fn name(&self) -> &str {
        "api"
    }

    async fn handle(&self, ctx: &RequestContext) -> Result<Report, HandlerError> {
        let address = self.realms.parse_address(ctx.path());
        if address.zone != Some(Zone::Api) {
            return Ok(Report::decline());
        }
        let Some(entry) = self.routes.get(&address.route) else {
            return Ok(Report::decline());
        };

        let request = match &entry.parser {
            Some(parser) => match parser.parse(ctx) {
                Ok(value) => Some(value),
                Err(err) => {
                    tracing::warn!(
                        route = %address.route,
                        error = %err,
                        "Cannot parse API request"
                    );
                    let body = ErrorBody::from_error(&err).to_json();
                    return Ok(Report::output(StatusCode::BAD_REQUEST, APPLICATION_JSON, body));
                }
            },
            None => None,
        };

        let result = entry
            .service
            .call(ApiContext {
                request,
                shared: &ctx.shared,
                head: &ctx.head,
            })
            .await?;

        let mut report = Report::decline().with_shared(RequestHeaders(ctx.head.headers.clone()));
        report.headers = result.headers;
        let Some(response) = result.response else {
            return Ok(report);
        };

        let body = serde_json::to_vec(&json!({ "data": response }))?;
        if !report.headers.contains_key(CONTENT_TYPE) {
            report
                .headers
                .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        }
        Ok(report
            .with_status(result.status.unwrap_or(StatusCode::OK))
            .with_body(ReportBody::Output(body.into()))
            .completed())
    }
}

/// `/{realm}` + `route`, tolerating a missing or doubled slash.
pub fn join_route(realm: &str, route: &str) -> String {
    let realm = realm.trim_matches('/');
    let route = route.trim_start_matches('/');
    if route.is_empty() {
        format!("/{realm}")
    } else {
        format!("/{realm}/{route}")
    }
}

/// Collects every plugin's services into one [`ApiServiceHandler`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ApiHandlerFactory;

#[async_trait]
impl HandlerFactory for ApiHandlerFactory {
    async fn create_handler(&self, env: &BuildEnv<'_>) -> Result<Arc<dyn Handler>, InitError> {
        let mut routes: HashMap<String, RouteEntry> = HashMap::new();
        for plugin in env.plugins.items() {
            let Some(realm) = plugin.realm.as_deref() else {
                continue;
            };
            for id in &plugin.services {
                let factory = env.resolver.resolve_service(id)?;
                let route = join_route(realm, &factory.route());
                let entry = RouteEntry {
                    parser: factory.input_parser(),
                    service: factory.create_service(),
                };
                if routes.insert(route.clone(), entry).is_some() {
                    tracing::warn!(
                        route = %route,
                        service = %id,
                        plugin = %plugin.name,
                        "API route replaced"
                    );
                } else {
                    tracing::debug!(route = %route, service = %id, "API route registered");
                }
            }
        }
        tracing::info!(routes = routes.len(), "API handler ready");
        Ok(Arc::new(ApiServiceHandler::new(env.realms.clone(), routes)))
    }
}
