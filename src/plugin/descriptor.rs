//! Plugin descriptor model.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One plugin as reported by the plugin scanner (here: the `[[plugins]]` config tables).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PluginDescriptor {
    /// Plugin name; becomes the second URL segment of its `src`/`web` folders.
    pub name: String,

    /// Plugin root directory.
    pub path: PathBuf,

    /// Realms ("doors") this plugin introduces into URL space, e.g. `admin`.
    #[serde(default)]
    pub areas: Vec<String>,

    /// Realm grouping this plugin's API services.
    #[serde(default)]
    pub realm: Option<String>,

    /// Service factory ids to mount under the realm.
    #[serde(default)]
    pub services: Vec<String>,

    /// Request handlers this plugin contributes to the chain.
    #[serde(default)]
    pub handlers: Vec<HandlerDescriptor>,

    /// Extra static folders: key relative to the `src` zone, value is a filesystem path.
    #[serde(default)]
    pub static_maps: BTreeMap<String, PathBuf>,
}

impl PluginDescriptor {
    /// Descriptor with a name and root directory and nothing else declared.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            areas: Vec::new(),
            realm: None,
            services: Vec::new(),
            handlers: Vec::new(),
            static_maps: BTreeMap::new(),
        }
    }
}

/// Declares a handler factory and its position in the chain.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HandlerDescriptor {
    /// Component id resolved through the container.
    pub factory_id: String,

    /// Higher weight runs earlier.
    #[serde(default)]
    pub weight: i32,

    /// Handlers this one should precede. Parsed but not used for ordering.
    #[serde(default)]
    pub before: Vec<String>,

    /// Handlers this one should follow. Parsed but not used for ordering.
    #[serde(default)]
    pub after: Vec<String>,
}

impl HandlerDescriptor {
    pub fn new(factory_id: impl Into<String>, weight: i32) -> Self {
        Self {
            factory_id: factory_id.into(),
            weight,
            before: Vec::new(),
            after: Vec::new(),
        }
    }

    /// True when relative ordering hints were declared.
    pub fn has_ordering_hints(&self) -> bool {
        !self.before.is_empty() || !self.after.is_empty()
    }
}
