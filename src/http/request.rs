//! Inbound stream events.
//!
//! # Responsibilities
//! - Carry the pseudo-headers (`:method`, `:path`, ...) and regular headers of a stream
//! - Carry the HTTP/2 frame flags observed when the stream opened
//! - Expose the body as a stream of chunks, read to completion before dispatch
//!
//! # Design Decisions
//! - The transport owns framing; this module only sees "headers + flags + chunks"
//! - Query strings are split off `:path` here so routing never sees them

use std::fmt;

use axum::body::{Body, Bytes, HttpBody};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request};
use futures_util::stream::{self, BoxStream};
use futures_util::{StreamExt, TryStreamExt};

/// Header carrying the request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Boxed error type produced by body sources.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Body data as it arrives from the transport.
pub type BodyChunks = BoxStream<'static, Result<Bytes, BoxError>>;

/// HTTP/2 frame flags seen on the HEADERS frame that opened the stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamFlags(u8);

impl StreamFlags {
    pub const END_STREAM: StreamFlags = StreamFlags(0x1);
    pub const END_HEADERS: StreamFlags = StreamFlags(0x4);

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn contains(&self, other: StreamFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: StreamFlags) -> Self {
        Self(self.0 | other.0)
    }
}

/// Pseudo-headers and regular headers of one request.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    /// Raw `:path` value, query string included.
    pub target: String,
    pub authority: Option<String>,
    pub scheme: Option<String>,
    pub headers: HeaderMap,
}

impl RequestHead {
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            authority: None,
            scheme: None,
            headers: HeaderMap::new(),
        }
    }

    /// Add a regular header (builder pattern). Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Path component of `:path`.
    pub fn path(&self) -> &str {
        match self.target.split_once('?') {
            Some((path, _)) => path,
            None => &self.target,
        }
    }

    /// Query component of `:path`, without the '?'.
    pub fn query(&self) -> Option<&str> {
        self.target.split_once('?').map(|(_, query)| query)
    }

    /// Header lookup that also answers the HTTP/2 pseudo-header names.
    pub fn header(&self, name: &str) -> Option<&str> {
        match name {
            ":method" => Some(self.method.as_str()),
            ":path" => Some(&self.target),
            ":authority" => self.authority.as_deref(),
            ":scheme" => self.scheme.as_deref(),
            _ => self.headers.get(name).and_then(|v| v.to_str().ok()),
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        self.header(X_REQUEST_ID)
    }
}

/// "A stream became readable": everything the dispatcher receives from the transport.
pub struct StreamEvent {
    pub head: RequestHead,
    pub flags: StreamFlags,
    pub body: BodyChunks,
}

impl StreamEvent {
    pub fn new(head: RequestHead, flags: StreamFlags, body: BodyChunks) -> Self {
        Self { head, flags, body }
    }

    /// Event whose body is already split into the given chunks.
    pub fn with_chunks<I>(head: RequestHead, chunks: I) -> Self
    where
        I: IntoIterator<Item = Bytes>,
        I::IntoIter: Send + 'static,
    {
        let chunks = chunks.into_iter();
        let flags = StreamFlags::END_HEADERS;
        Self::new(head, flags, stream::iter(chunks.map(Ok)).boxed())
    }

    /// Event without body data (END_STREAM set on the headers).
    pub fn without_body(head: RequestHead) -> Self {
        Self::new(
            head,
            StreamFlags::END_HEADERS.union(StreamFlags::END_STREAM),
            stream::empty().boxed(),
        )
    }

    /// Translate a request produced by the HTTP/1.1 + HTTP/2 server into a stream event.
    pub fn from_request(request: Request<Body>) -> Self {
        let (parts, body) = request.into_parts();

        let mut flags = StreamFlags::END_HEADERS;
        if body.is_end_stream() {
            flags = flags.union(StreamFlags::END_STREAM);
        }

        let target = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());
        let authority = parts
            .uri
            .authority()
            .map(|a| a.to_string())
            .or_else(|| {
                parts
                    .headers
                    .get(axum::http::header::HOST)
                    .and_then(|h| h.to_str().ok())
                    .map(str::to_string)
            });

        let head = RequestHead {
            method: parts.method,
            target,
            authority,
            scheme: parts.uri.scheme_str().map(str::to_string),
            headers: parts.headers,
        };
        let chunks = body.into_data_stream().map_err(|e| Box::new(e) as BoxError).boxed();

        Self::new(head, flags, chunks)
    }
}

impl fmt::Debug for StreamEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamEvent")
            .field("head", &self.head)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// Read every chunk until end of input and concatenate them.
pub async fn collect_body(mut chunks: BodyChunks) -> Result<Bytes, BoxError> {
    let mut parts: Vec<Bytes> = Vec::new();
    while let Some(chunk) = chunks.next().await {
        parts.push(chunk?);
    }
    Ok(match parts.len() {
        0 => Bytes::new(),
        1 => parts.swap_remove(0),
        _ => Bytes::from(parts.concat()),
    })
}
