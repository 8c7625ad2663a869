//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum Router whose single fallback endpoint feeds the Dispatcher
//! - Serve HTTP/2 (h2c prior knowledge or ALPN) with HTTP/1.1 fallback
//! - Wire up middleware (request id, tracing, timeout, body limit)
//! - Stop accepting on shutdown and drain open connections
//!
//! # Design Decisions
//! - Plain TCP uses the hyper-util auto builder directly so the connection limit applies
//! - TLS is delegated to axum-server (rustls)
//! - Every request, whatever its path or method, goes through `Dispatcher::dispatch`

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use hyper_util::service::TowerToHyperService;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::http::request::StreamEvent;
use crate::http::response::ResponseSlot;
use crate::lifecycle::ShutdownSignal;
use crate::net::{ConnectionTracker, Listener};
use crate::observability::metrics;

/// Assigns a UUID v4 to requests that arrive without `x-request-id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestUuid;

impl MakeRequestId for RequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// HTTP front end of the dispatcher.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    pub fn new(dispatcher: Arc<Dispatcher>, config: ServerConfig) -> Self {
        let router = Self::build_router(&config, dispatcher);
        Self { router, config }
    }

    /// The fully layered router, e.g. for in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, dispatcher: Arc<Dispatcher>) -> Router {
        Router::new()
            .fallback(dispatch_endpoint)
            .with_state(dispatcher)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(RequestUuid))
    }

    /// Serve plain TCP connections until `shutdown` fires, then drain.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let http2_only = self.config.listener.http2_only;
        tracing::info!(address = %addr, http2_only, "HTTP server starting");

        let mut builder = auto::Builder::new(TokioExecutor::new());
        if http2_only {
            builder = builder.http2_only();
        }
        let tracker = ConnectionTracker::new();

        loop {
            let accepted = tokio::select! {
                _ = shutdown.recv() => break,
                accepted = listener.accept() => accepted,
            };
            let (stream, peer, permit) = match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::warn!(error = %e, "Accept failed");
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    continue;
                }
            };

            let guard = tracker.track();
            metrics::set_active_connections(tracker.active_count());
            let service = TowerToHyperService::new(self.router.clone());
            let builder = builder.clone();
            let tracker = tracker.clone();
            let mut conn_shutdown = shutdown.clone();

            tokio::spawn(async move {
                let _permit = permit;
                let conn = builder.serve_connection(TokioIo::new(stream), service);
                tokio::pin!(conn);

                let mut draining = false;
                let result = loop {
                    tokio::select! {
                        res = conn.as_mut() => break res,
                        _ = conn_shutdown.recv(), if !draining => {
                            draining = true;
                            conn.as_mut().graceful_shutdown();
                        }
                    }
                };
                if let Err(e) = result {
                    tracing::debug!(
                        peer = %peer,
                        connection_id = %guard.id(),
                        error = %e,
                        "Connection error"
                    );
                }
                drop(guard);
                metrics::set_active_connections(tracker.active_count());
            });
        }

        drop(listener);
        let drain = Duration::from_secs(self.config.timeouts.shutdown_secs);
        tracing::info!(active = tracker.active_count(), "Draining connections");
        if !tracker.drain(drain).await {
            tracing::warn!(
                remaining = tracker.active_count(),
                "Drain timeout expired, closing remaining connections"
            );
        }
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve TLS connections on `addr` until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");
        let handle = axum_server::Handle::new();
        let drain = Duration::from_secs(self.config.timeouts.shutdown_secs);

        tokio::spawn({
            let handle = handle.clone();
            async move {
                shutdown.recv().await;
                handle.graceful_shutdown(Some(drain));
            }
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;
        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Single endpoint: every stream becomes one dispatch.
async fn dispatch_endpoint(
    State(dispatcher): State<Arc<Dispatcher>>,
    request: Request,
) -> ResponseSlot {
    let mut slot = ResponseSlot::new();
    dispatcher
        .dispatch(StreamEvent::from_request(request), &mut slot)
        .await;
    slot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::HandlerChain;
    use axum::body::Body;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn empty_chain_answers_404_with_request_id() {
        let server = HttpServer::new(
            Arc::new(Dispatcher::new(HandlerChain::default())),
            ServerConfig::default(),
        );
        let response = server
            .router()
            .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn method_gate_runs_behind_router() {
        let server = HttpServer::new(
            Arc::new(Dispatcher::new(HandlerChain::default())),
            ServerConfig::default(),
        );
        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/anything")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn streamed_body_over_limit_is_413() {
        let mut config = ServerConfig::default();
        config.security.max_body_size = 64;
        let server = HttpServer::new(Arc::new(Dispatcher::new(HandlerChain::default())), config);

        let chunks = (0..4).map(|_| Ok::<_, std::io::Error>(vec![b'x'; 32]));
        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .body(Body::from_stream(futures_util::stream::iter(chunks)))
            .unwrap();
        assert!(request.headers().get("content-length").is_none());

        let response = server.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
