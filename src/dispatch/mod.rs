//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! StreamEvent (headers + flags + body chunks)
//!     → dispatcher.rs (method gate, read whole body)
//!     → context.rs (fresh RequestContext + empty SharedState)
//!     → chain.rs (handlers by descending weight, stop at first complete)
//!     → report.rs (merge headers / status / body / shared contributions)
//!     → dispatcher.rs (write file, output, 404 or 500)
//! ```
//!
//! # Design Decisions
//! - The chain is immutable after startup and shared without locks
//! - SharedState is owned by exactly one in-flight request
//! - Set-Cookie values accumulate, every other header is last-writer-wins

pub mod chain;
pub mod context;
pub mod dispatcher;
pub mod report;

pub use chain::{
    BuildEnv, ChainEntry, ChainError, Handler, HandlerChain, HandlerError, HandlerFactory,
    InitError,
};
pub use context::{RequestContext, RequestHeaders, SharedState};
pub use dispatcher::{DispatchError, Dispatcher};
pub use report::{merge_headers, Report, ReportBody, ResponseDraft};
