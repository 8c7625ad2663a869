//! API service contracts.
//!
//! A service factory always yields a route and a service; pre-parsing the
//! request body is an optional capability exposed through
//! [`ServiceFactory::input_parser`].

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::dispatch::{RequestContext, SharedState};
use crate::http::request::{BoxError, RequestHead};

/// Request body could not be decoded. Answered with 400.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("request body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Invalid(String),
}

/// Unexpected service failure. Answered with 500.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Message(String),
    #[error("{context}")]
    Source {
        context: String,
        #[source]
        source: BoxError,
    },
}

impl ServiceError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Source {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

/// What a service sees of the request.
pub struct ApiContext<'a> {
    /// Output of the input parser, `None` when the factory has no parser.
    pub request: Option<Value>,
    pub shared: &'a SharedState,
    pub head: &'a RequestHead,
}

/// Service outcome. No response means "not mine": the chain moves on.
#[derive(Debug, Default)]
pub struct ServiceResult {
    pub response: Option<Value>,
    pub headers: HeaderMap,
    pub status: Option<StatusCode>,
}

impl ServiceResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn response(value: impl Into<Value>) -> Self {
        Self {
            response: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Append a header; invalid values are dropped.
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.append(name, value);
        }
        self
    }
}

/// Decodes the request body into the structured request given to a service.
pub trait InputParser: Send + Sync {
    fn parse(&self, ctx: &RequestContext) -> Result<Value, ParseError>;
}

#[async_trait]
pub trait Service: Send + Sync {
    async fn call(&self, ctx: ApiContext<'_>) -> Result<ServiceResult, ServiceError>;
}

/// Produces one API endpoint.
pub trait ServiceFactory: Send + Sync {
    /// Route relative to the plugin realm, e.g. `/load/config`.
    fn route(&self) -> String;

    fn input_parser(&self) -> Option<std::sync::Arc<dyn InputParser>> {
        None
    }

    fn create_service(&self) -> std::sync::Arc<dyn Service>;
}

/// Decodes the `{"data": ...}` envelope posted by browser clients.
///
/// An empty body yields `null`; a body without `data` yields `null` as well.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonDataParser;

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Value,
}

impl InputParser for JsonDataParser {
    fn parse(&self, ctx: &RequestContext) -> Result<Value, ParseError> {
        if ctx.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        let envelope: Envelope = serde_json::from_slice(&ctx.body)?;
        Ok(envelope.data)
    }
}
