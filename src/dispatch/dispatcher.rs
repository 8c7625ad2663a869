//! Stream dispatcher.
//!
//! # Responsibilities
//! - Gate request methods (HEAD, GET, POST)
//! - Read the whole body before any handler runs
//! - Run the handler chain and write the accumulated response
//! - Convert every failure into a 500 with a JSON error body
//!
//! # Design Decisions
//! - One request is processed sequentially; concurrency comes from many streams
//! - Writability is checked right before each write; a closed stream drops the response
//! - No retries: every failure is terminal for its request

use std::sync::Arc;
use std::time::Instant;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use http_body_util::LengthLimitError;

use crate::dispatch::chain::{ChainError, HandlerChain};
use crate::dispatch::context::RequestContext;
use crate::dispatch::report::{ReportBody, ResponseDraft};
use crate::http::request::{collect_body, BoxError, StreamEvent};
use crate::http::response::{ErrorBody, OutgoingBody, ResponseStream, StreamError};
use crate::observability::metrics;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

/// Failures converted to 500 responses.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to read request body")]
    Body(#[source] BoxError),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error("cannot open '{path}'")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Stream(#[from] StreamError),
}

/// Turns stream events into responses by running the handler chain.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    chain: Arc<HandlerChain>,
}

impl Dispatcher {
    pub fn new(chain: HandlerChain) -> Self {
        Self {
            chain: Arc::new(chain),
        }
    }

    pub fn chain(&self) -> &HandlerChain {
        &self.chain
    }

    /// Fully consume one stream.
    pub async fn dispatch<S: ResponseStream>(&self, event: StreamEvent, stream: &mut S) {
        let start = Instant::now();
        let method = event.head.method.clone();
        tracing::debug!(
            method = %method,
            path = %event.head.target,
            request_id = event.head.request_id().unwrap_or("-"),
            "Request received"
        );

        if !is_allowed(&method) {
            let status = respond_405(stream);
            metrics::record_request(method.as_str(), status.as_u16(), start);
            return;
        }

        let status = match self.process(event, stream).await {
            Ok(status) => status,
            Err(err) => respond_500(stream, &err),
        };
        metrics::record_request(method.as_str(), status.as_u16(), start);
    }

    async fn process<S: ResponseStream>(
        &self,
        event: StreamEvent,
        stream: &mut S,
    ) -> Result<StatusCode, DispatchError> {
        let body = match collect_body(event.body).await {
            Ok(body) => body,
            Err(err) if exceeds_body_limit(&*err) => return Ok(respond_413(stream)),
            Err(err) => return Err(DispatchError::Body(err)),
        };
        let mut ctx = RequestContext::new(event.head, event.flags, body);

        let draft = self.chain.run(&mut ctx).await?;
        if draft.complete {
            write_draft(stream, draft).await
        } else {
            Ok(respond_404(stream))
        }
    }
}

fn is_allowed(method: &Method) -> bool {
    *method == Method::HEAD || *method == Method::GET || *method == Method::POST
}

async fn write_draft<S: ResponseStream>(
    stream: &mut S,
    draft: ResponseDraft,
) -> Result<StatusCode, DispatchError> {
    let status = draft.status.unwrap_or(StatusCode::OK);
    let body = match draft.body {
        Some(ReportBody::File(path)) => {
            let open = |source| DispatchError::File {
                path: path.display().to_string(),
                source,
            };
            let file = tokio::fs::File::open(&path).await.map_err(open)?;
            let len = file.metadata().await.map_err(open)?.len();
            OutgoingBody::File { file, len }
        }
        Some(ReportBody::Output(bytes)) => OutgoingBody::Bytes(bytes),
        None => OutgoingBody::Bytes(Default::default()),
    };
    if stream.is_writable() {
        stream.respond(status, draft.headers, body)?;
    }
    Ok(status)
}

fn plain_headers(content_type: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers
}

fn respond_405<S: ResponseStream>(stream: &mut S) -> StatusCode {
    let status = StatusCode::METHOD_NOT_ALLOWED;
    if stream.is_writable() {
        let body = OutgoingBody::text("Only HEAD, GET and POST methods are allowed.");
        if let Err(err) = stream.respond(status, plain_headers(TEXT_PLAIN), body) {
            tracing::debug!(error = %err, "405 response dropped");
        }
    }
    status
}

/// A streamed body without Content-Length hits the limit while being read.
fn exceeds_body_limit(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        if err.is::<LengthLimitError>() {
            return true;
        }
        current = err.source();
    }
    false
}

fn respond_413<S: ResponseStream>(stream: &mut S) -> StatusCode {
    let status = StatusCode::PAYLOAD_TOO_LARGE;
    tracing::warn!("Request body exceeds the configured limit");
    if stream.is_writable() {
        let body = OutgoingBody::text("Request body is too large.");
        if let Err(err) = stream.respond(status, plain_headers(TEXT_PLAIN), body) {
            tracing::debug!(error = %err, "413 response dropped");
        }
    }
    status
}

fn respond_404<S: ResponseStream>(stream: &mut S) -> StatusCode {
    let status = StatusCode::NOT_FOUND;
    if stream.is_writable() {
        let body = OutgoingBody::text("Appropriate handler is not found for this request.");
        if let Err(err) = stream.respond(status, plain_headers(TEXT_PLAIN), body) {
            tracing::debug!(error = %err, "404 response dropped");
        }
    }
    status
}

fn respond_500<S: ResponseStream>(stream: &mut S, err: &DispatchError) -> StatusCode {
    let status = StatusCode::INTERNAL_SERVER_ERROR;
    let body = ErrorBody::from_error(err).to_json();
    tracing::error!(error = %body, "Request failed");
    if stream.is_writable() {
        if let Err(err) = stream.respond(
            status,
            plain_headers(APPLICATION_JSON),
            OutgoingBody::text(body),
        ) {
            tracing::debug!(error = %err, "500 response dropped");
        }
    }
    status
}
