//! Built-in request handlers.
//!
//! # Data Flow
//! ```text
//! RequestContext
//!     → api.rs (api zone, exact route → parser? → service → {"data": ...})
//!     → static_files.rs (override maps → plugin folders → default roots → file)
//! ```

pub mod api;
pub mod service;
pub mod static_files;

pub use api::{join_route, ApiHandlerFactory, ApiServiceHandler, RouteEntry};
pub use service::{
    ApiContext, InputParser, JsonDataParser, ParseError, Service, ServiceError, ServiceFactory,
    ServiceResult,
};
pub use static_files::{StaticFileHandler, StaticHandlerFactory, StaticRoots};
