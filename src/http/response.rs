//! Outbound side of a stream.
//!
//! # Responsibilities
//! - Accept exactly one final response per stream (status, headers, body or file)
//! - Report whether the stream can still be written to
//! - Turn the written response into an HTTP response for the server
//!
//! # Design Decisions
//! - Files are opened by the dispatcher and streamed here, never buffered
//! - Writing to a closed stream is an error the dispatcher checks for up front

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tokio_util::io::ReaderStream;

/// Response payload handed to a stream.
#[derive(Debug)]
pub enum OutgoingBody {
    Bytes(Bytes),
    File { file: tokio::fs::File, len: u64 },
}

impl OutgoingBody {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Bytes(Bytes::from(text.into()))
    }
}

/// Errors raised while writing to a stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("stream is no longer writable")]
    Closed,
}

/// Sink for the final response of one stream.
pub trait ResponseStream: Send {
    /// False once a response was written or the peer went away.
    fn is_writable(&self) -> bool;

    fn respond(
        &mut self,
        status: StatusCode,
        headers: HeaderMap,
        body: OutgoingBody,
    ) -> Result<(), StreamError>;
}

/// Stream backed by the HTTP server: holds the single response until it is returned.
#[derive(Debug, Default)]
pub struct ResponseSlot {
    response: Option<Response>,
    closed: bool,
}

impl ResponseSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the peer as gone; later writes are skipped.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_empty(&self) -> bool {
        self.response.is_none()
    }
}

impl ResponseStream for ResponseSlot {
    fn is_writable(&self) -> bool {
        !self.closed && self.response.is_none()
    }

    fn respond(
        &mut self,
        status: StatusCode,
        headers: HeaderMap,
        body: OutgoingBody,
    ) -> Result<(), StreamError> {
        if !self.is_writable() {
            return Err(StreamError::Closed);
        }
        let mut headers = headers;
        let body = match body {
            OutgoingBody::Bytes(bytes) => Body::from(bytes),
            OutgoingBody::File { file, len } => {
                headers.insert(axum::http::header::CONTENT_LENGTH, len.into());
                Body::from_stream(ReaderStream::new(file))
            }
        };
        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        self.response = Some(response);
        Ok(())
    }
}

impl IntoResponse for ResponseSlot {
    fn into_response(self) -> Response {
        // an aborted stream has nothing to send
        self.response
            .unwrap_or_else(|| StatusCode::INTERNAL_SERVER_ERROR.into_response())
    }
}

/// JSON error envelope: `{"error": {"message": ..., "stack": ...}}`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorDetail {
    pub message: String,
    pub stack: String,
}

impl ErrorBody {
    /// Message from the error itself, "stack" from its `source()` chain.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut stack = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            stack.push(format!("caused by: {cause}"));
            source = cause.source();
        }
        Self {
            error: ErrorDetail {
                message: err.to_string(),
                stack: stack.join("\n"),
            },
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"error":{"message":"Unknown error","stack":""}}"#.to_string()
        })
    }
}
