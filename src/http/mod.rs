//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection (HTTP/2 or HTTP/1.1)
//!     → server.rs (Axum router, request id, trace, timeout, body limit)
//!     → request.rs (headers + flags + body chunks as a StreamEvent)
//!     → [dispatcher runs the handler chain]
//!     → response.rs (ResponseSlot: one status + headers + bytes-or-file)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestHead, StreamEvent, StreamFlags, X_REQUEST_ID};
pub use response::{ErrorBody, OutgoingBody, ResponseSlot, ResponseStream, StreamError};
pub use server::HttpServer;
