//! Per-request context handed to every handler in the chain.

use std::str::Utf8Error;

use axum::body::Bytes;
use axum::http::{Extensions, HeaderMap};

use crate::http::request::{RequestHead, StreamFlags};

/// Typed key/value store handlers use to pass derived data down the chain.
///
/// Keys are Rust types: a handler that parses a session inserts a `Session`
/// value, later handlers ask for `get::<Session>()`. The store belongs to one
/// in-flight request and is dropped with it.
#[derive(Debug, Default, Clone)]
pub struct SharedState(Extensions);

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous value of the same type.
    pub fn insert<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.0.insert(value)
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.0.get::<T>()
    }

    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.get::<T>().is_some()
    }

    pub fn remove<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.0.remove::<T>()
    }

    /// Move every entry of `other` into this store; `other` wins on conflicts.
    pub fn extend(&mut self, other: SharedState) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Request headers as seen by the API handler, shared with services and later handlers.
#[derive(Debug, Clone)]
pub struct RequestHeaders(pub HeaderMap);

/// Everything known about one request once its body has been read.
#[derive(Debug)]
pub struct RequestContext {
    pub head: RequestHead,
    pub flags: StreamFlags,
    pub body: Bytes,
    pub shared: SharedState,
}

impl RequestContext {
    /// Fresh context with an empty shared store.
    pub fn new(head: RequestHead, flags: StreamFlags, body: Bytes) -> Self {
        Self {
            head,
            flags,
            body,
            shared: SharedState::new(),
        }
    }

    /// Path component of `:path`.
    pub fn path(&self) -> &str {
        self.head.path()
    }

    pub fn body_str(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(&self.body)
    }
}
