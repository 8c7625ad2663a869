//! HTTP/2 request dispatcher with a pluggable handler chain.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client stream        ┌──────────────────────────────────────────────────────┐
//!     ─────────────────────┼─▶ net ──▶ http::server ──▶ dispatch::Dispatcher       │
//!                          │   (listener, TLS)        │                            │
//!                          │                          ▼                            │
//!                          │              dispatch::HandlerChain (by weight)       │
//!                          │               ├─ handlers::api   (api zone)           │
//!                          │               ├─ handlers::static_files (src/web)     │
//!                          │               └─ plugin handlers …                    │
//!                          │                          │                            │
//!     Response             │                          ▼                            │
//!     ◀────────────────────┼── http::response ◀── merged Report (file / output)    │
//!                          │                                                       │
//!                          │  config · plugin · routing · services · lifecycle ·   │
//!                          │  observability                                        │
//!                          └──────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod dispatch;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod plugin;
pub mod routing;
pub mod services;

pub use config::ServerConfig;
pub use dispatch::Dispatcher;
pub use http::HttpServer;
pub use lifecycle::{Application, Shutdown};
