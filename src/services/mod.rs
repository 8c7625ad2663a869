//! Services and component ids shipped with the server.
//!
//! The built-in plugin `http2` owns the `http2` realm and mounts:
//! - `/api/http2/load/namespaces` → plugin source locations
//! - `/api/http2/load/config` → the `[web]` config table

pub mod config;
pub mod namespaces;

pub use config::{WebConfigFactory, WebConfigService};
pub use namespaces::{NamespacesFactory, NamespacesService};

/// Realm and plugin name of the built-in services.
pub const HTTP2_REALM: &str = "http2";

pub const API_HANDLER_ID: &str = "http2.api";
pub const STATIC_HANDLER_ID: &str = "http2.static";
pub const NAMESPACES_SERVICE_ID: &str = "http2.load.namespaces";
pub const CONFIG_SERVICE_ID: &str = "http2.load.config";

/// Chain weight of the API handler; runs before static resolution.
pub const API_HANDLER_WEIGHT: i32 = 100;
pub const STATIC_HANDLER_WEIGHT: i32 = 0;
