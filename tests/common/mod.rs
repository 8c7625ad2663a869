//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use serde_json::Value;
use tokio::io::AsyncReadExt;

use h2_dispatch::dispatch::{
    BuildEnv, Handler, HandlerError, HandlerFactory, InitError, Report, RequestContext,
};
use h2_dispatch::handlers::{
    ApiContext, InputParser, ParseError, Service, ServiceError, ServiceFactory, ServiceResult,
};
use h2_dispatch::http::request::{RequestHead, StreamEvent};
use h2_dispatch::http::response::{OutgoingBody, ResponseStream, StreamError};

/// What a [`RecordingStream`] received.
#[derive(Debug)]
pub struct Written {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: OutgoingBody,
}

/// In-memory stream that records the response written to it.
#[derive(Debug, Default)]
pub struct RecordingStream {
    pub written: Option<Written>,
    pub closed: bool,
    pub attempts: usize,
}

impl RecordingStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// A stream the peer already reset.
    pub fn closed() -> Self {
        Self {
            closed: true,
            ..Self::default()
        }
    }

    pub fn status(&self) -> StatusCode {
        self.written.as_ref().expect("no response written").status
    }

    pub fn header(&self, name: &str) -> Vec<String> {
        self.written
            .as_ref()
            .expect("no response written")
            .headers
            .get_all(name)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    /// Body bytes, reading the file when one was streamed.
    pub async fn body(&mut self) -> Vec<u8> {
        match &mut self.written.as_mut().expect("no response written").body {
            OutgoingBody::Bytes(bytes) => bytes.to_vec(),
            OutgoingBody::File { file, .. } => {
                let mut data = Vec::new();
                file.read_to_end(&mut data).await.unwrap();
                data
            }
        }
    }

    pub async fn body_text(&mut self) -> String {
        String::from_utf8(self.body().await).unwrap()
    }

    pub async fn body_json(&mut self) -> Value {
        serde_json::from_slice(&self.body().await).unwrap()
    }
}

impl ResponseStream for RecordingStream {
    fn is_writable(&self) -> bool {
        !self.closed && self.written.is_none()
    }

    fn respond(
        &mut self,
        status: StatusCode,
        headers: HeaderMap,
        body: OutgoingBody,
    ) -> Result<(), StreamError> {
        self.attempts += 1;
        if !self.is_writable() {
            return Err(StreamError::Closed);
        }
        self.written = Some(Written {
            status,
            headers,
            body,
        });
        Ok(())
    }
}

pub fn event(method: Method, target: &str, body: &'static str) -> StreamEvent {
    let head = RequestHead::new(method, target);
    if body.is_empty() {
        StreamEvent::without_body(head)
    } else {
        StreamEvent::with_chunks(head, vec![Bytes::from_static(body.as_bytes())])
    }
}

pub fn get(target: &str) -> StreamEvent {
    event(Method::GET, target, "")
}

type Behaviour = dyn Fn(&RequestContext) -> Result<Report, HandlerError> + Send + Sync;

/// Handler that counts calls, appends its name to a shared log and runs a closure.
pub struct ScriptedHandler {
    name: String,
    calls: Arc<AtomicUsize>,
    log: Arc<Mutex<Vec<String>>>,
    behaviour: Arc<Behaviour>,
}

#[async_trait]
impl Handler for ScriptedHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, ctx: &RequestContext) -> Result<Report, HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(self.name.clone());
        (self.behaviour)(ctx)
    }
}

/// Factory for a [`ScriptedHandler`]; keeps the counters for assertions.
#[derive(Clone)]
pub struct ScriptedFactory {
    pub name: String,
    pub calls: Arc<AtomicUsize>,
    pub log: Arc<Mutex<Vec<String>>>,
    behaviour: Arc<Behaviour>,
}

impl ScriptedFactory {
    pub fn new<F>(name: &str, log: &Arc<Mutex<Vec<String>>>, behaviour: F) -> Self
    where
        F: Fn(&RequestContext) -> Result<Report, HandlerError> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
            log: log.clone(),
            behaviour: Arc::new(behaviour),
        }
    }

    /// Handler that always declines.
    pub fn declining(name: &str, log: &Arc<Mutex<Vec<String>>>) -> Self {
        Self::new(name, log, |_| Ok(Report::decline()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HandlerFactory for ScriptedFactory {
    async fn create_handler(&self, _env: &BuildEnv<'_>) -> Result<Arc<dyn Handler>, InitError> {
        Ok(Arc::new(ScriptedHandler {
            name: self.name.clone(),
            calls: self.calls.clone(),
            log: self.log.clone(),
            behaviour: self.behaviour.clone(),
        }))
    }
}

/// Parser that rejects every body.
pub struct RejectingParser;

impl InputParser for RejectingParser {
    fn parse(&self, _ctx: &RequestContext) -> Result<Value, ParseError> {
        Err(ParseError::Invalid("request rejected by parser".into()))
    }
}

type ServiceFn = dyn Fn(ApiContext<'_>) -> Result<ServiceResult, ServiceError> + Send + Sync;

/// Service that counts calls and runs a closure.
pub struct CountingService {
    calls: Arc<AtomicUsize>,
    behaviour: Arc<ServiceFn>,
}

#[async_trait]
impl Service for CountingService {
    async fn call(&self, ctx: ApiContext<'_>) -> Result<ServiceResult, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.behaviour)(ctx)
    }
}

/// Service factory with a fixed route and optional parser.
#[derive(Clone)]
pub struct CountingServiceFactory {
    pub route: String,
    pub calls: Arc<AtomicUsize>,
    parser: Option<Arc<dyn InputParser>>,
    behaviour: Arc<ServiceFn>,
}

impl CountingServiceFactory {
    pub fn new<F>(route: &str, behaviour: F) -> Self
    where
        F: Fn(ApiContext<'_>) -> Result<ServiceResult, ServiceError> + Send + Sync + 'static,
    {
        Self {
            route: route.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
            parser: None,
            behaviour: Arc::new(behaviour),
        }
    }

    pub fn with_parser(mut self, parser: Arc<dyn InputParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ServiceFactory for CountingServiceFactory {
    fn route(&self) -> String {
        self.route.clone()
    }

    fn input_parser(&self) -> Option<Arc<dyn InputParser>> {
        self.parser.clone()
    }

    fn create_service(&self) -> Arc<dyn Service> {
        Arc::new(CountingService {
            calls: self.calls.clone(),
            behaviour: self.behaviour.clone(),
        })
    }
}

/// Write `contents` to `root/relative`, creating parent folders.
pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}
