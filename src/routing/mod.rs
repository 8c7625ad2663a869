//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path (query already split off)
//!     → address.rs (realm / zone / route decomposition)
//!     → matcher.rs (segment-aware prefix conditions)
//!     → router.rs (prefix → directory table, first match wins)
//!
//! Table Compilation (at startup):
//!     PluginDescriptor[]
//!     → RealmRegistry (known realms)
//!     → PathMap (override mappings, then plugin src/web folders)
//!     → Freeze as immutable tables
//! ```
//!
//! # Design Decisions
//! - Tables compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same mapping

pub mod address;
pub mod matcher;
pub mod router;

pub use address::{Address, RealmRegistry, Zone};
pub use matcher::{Matcher, PathPrefixMatcher};
pub use router::PathMap;
