//! Plugin subsystem.
//!
//! # Data Flow
//! ```text
//! [[plugins]] config tables
//!     → descriptor.rs (PluginDescriptor, HandlerDescriptor)
//!     → registry.rs (ordered, read-only PluginRegistry)
//!     → container.rs (ids → handler / service factories)
//!     → consumed once by chain construction and the built-in handlers
//! ```
//!
//! # Design Decisions
//! - Discovery order is preserved everywhere; it is the only tie-break
//! - Unknown component ids abort startup

pub mod container;
pub mod descriptor;
pub mod registry;

pub use container::{Container, ResolveError, Resolver};
pub use descriptor::{HandlerDescriptor, PluginDescriptor};
pub use registry::PluginRegistry;
