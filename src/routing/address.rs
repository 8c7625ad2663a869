//! URL address decomposition.
//!
//! General form of a request path:
//! ```text
//! /{realm}/{zone}/{route...}
//!   realm  optional, one of the realms declared by plugins ("admin", "pub", ...)
//!   zone   optional, one of "api", "src", "web"
//!   route  everything that is left, always starting with '/' unless empty
//! ```

use std::fmt;

use crate::plugin::PluginRegistry;

/// Fixed URL zones routed to the service, source and static handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    Api,
    Src,
    Web,
}

impl Zone {
    pub const ALL: [Zone; 3] = [Zone::Api, Zone::Src, Zone::Web];

    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::Api => "api",
            Zone::Src => "src",
            Zone::Web => "web",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decomposed request path. Recomputed per lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub realm: Option<String>,
    pub zone: Option<Zone>,
    pub route: String,
}

/// Known realms, collected once from plugin descriptors.
#[derive(Debug, Clone, Default)]
pub struct RealmRegistry {
    realms: Vec<String>,
}

impl RealmRegistry {
    /// Build from explicit realm names; duplicates keep their first position.
    pub fn new<I, S>(realms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for realm in realms {
            let realm = realm.into();
            if !realm.is_empty() && !unique.contains(&realm) {
                unique.push(realm);
            }
        }
        Self { realms: unique }
    }

    /// Union of every plugin's `areas`, in discovery order.
    pub fn from_plugins(plugins: &PluginRegistry) -> Self {
        Self::new(plugins.items().iter().flat_map(|p| p.areas.iter().cloned()))
    }

    pub fn realms(&self) -> &[String] {
        &self.realms
    }

    /// Split a path (without query string) into realm, zone and route.
    pub fn parse_address(&self, path: &str) -> Address {
        let mut rest = path;

        // at most one realm is allowed in the URL
        let mut realm = None;
        for one in &self.realms {
            if let Some(tail) = strip_segment(rest, one) {
                realm = Some(one.clone());
                rest = tail;
                break;
            }
        }

        let mut zone = None;
        for candidate in Zone::ALL {
            if let Some(tail) = strip_segment(rest, candidate.as_str()) {
                zone = Some(candidate);
                rest = tail;
                break;
            }
        }

        Address {
            realm,
            zone,
            route: rest.to_string(),
        }
    }
}

/// Strip a leading `/{segment}` when it is a whole path segment.
fn strip_segment<'a>(path: &'a str, segment: &str) -> Option<&'a str> {
    let tail = path.strip_prefix('/')?.strip_prefix(segment)?;
    if tail.is_empty() || tail.starts_with('/') {
        Some(tail)
    } else {
        None
    }
}
