//! Static resource handler.
//!
//! # Responsibilities
//! - Map `/src/<plugin>` and `/web/<plugin>` onto plugin folders
//! - Apply explicit override mappings ahead of the plugin folders
//! - Resolve unmapped paths under the default source and web roots
//! - Report regular files with a detected content type
//!
//! # Design Decisions
//! - No caching: every request re-resolves and re-stats
//! - Paths with `..` segments are declined
//! - Unknown content type declines rather than guessing

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::dispatch::{
    BuildEnv, Handler, HandlerError, HandlerFactory, InitError, Report, RequestContext,
};
use crate::routing::router::join_segments;
use crate::routing::{PathMap, RealmRegistry, Zone};

/// Where unmapped requests land.
#[derive(Debug, Clone)]
pub struct StaticRoots {
    pub web_root: PathBuf,
    pub src_root: PathBuf,
    pub index_name: String,
}

/// Resolves request paths to files and streams them.
#[derive(Debug)]
pub struct StaticFileHandler {
    realms: Arc<RealmRegistry>,
    mappings: PathMap,
    roots: StaticRoots,
}

impl StaticFileHandler {
    pub fn new(realms: Arc<RealmRegistry>, mappings: PathMap, roots: StaticRoots) -> Self {
        Self {
            realms,
            mappings,
            roots,
        }
    }

    pub fn mappings(&self) -> &PathMap {
        &self.mappings
    }

    /// Filesystem candidate for a request path. Does not touch the disk.
    pub fn resolve_path(&self, path: &str) -> Option<PathBuf> {
        let address = self.realms.parse_address(path);
        let mut normalized = match address.zone {
            Some(zone) => format!("/{}{}", zone, address.route),
            None => address.route.clone(),
        };
        if normalized.split('/').any(|segment| segment == "..") {
            return None;
        }
        let wants_index = !matches!(address.zone, Some(Zone::Api) | Some(Zone::Src));
        if wants_index && normalized.ends_with('/') {
            normalized.push_str(&self.roots.index_name);
        }

        if let Some(mapped) = self.mappings.resolve(&normalized) {
            return Some(mapped);
        }
        let fallback = match address.zone {
            Some(Zone::Src) => {
                join_segments(&self.roots.src_root, strip_zone(&normalized, Zone::Src))
            }
            Some(Zone::Web) => {
                join_segments(&self.roots.web_root, strip_zone(&normalized, Zone::Web))
            }
            _ => join_segments(&self.roots.web_root, &normalized),
        };
        Some(fallback)
    }
}

fn strip_zone(path: &str, zone: Zone) -> &str {
    path.strip_prefix('/')
        .and_then(|p| p.strip_prefix(zone.as_str()))
        .unwrap_or(path)
}

#[async_trait]
impl Handler for StaticFileHandler {
    fn name(&self) -> &str {
        "static"
    }

    async fn handle(&self, ctx: &RequestContext) -> Result<Report, HandlerError> {
        let Some(path) = self.resolve_path(ctx.path()) else {
            tracing::debug!(path = %ctx.path(), "Refusing path outside mapped roots");
            return Ok(Report::decline());
        };
        let is_file = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta.is_file(),
            Err(_) => false,
        };
        if !is_file {
            return Ok(Report::decline());
        }
        let Some(mime) = mime_guess::from_path(&path).first() else {
            tracing::debug!(path = %path.display(), "Unknown content type");
            return Ok(Report::decline());
        };
        tracing::trace!(path = %path.display(), mime = %mime, "Static file");
        Ok(Report::file(mime.essence_str(), path))
    }
}

/// Builds the prefix table from every plugin.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticHandlerFactory;

#[async_trait]
impl HandlerFactory for StaticHandlerFactory {
    async fn create_handler(&self, env: &BuildEnv<'_>) -> Result<Arc<dyn Handler>, InitError> {
        let root = env.paths.root.as_path();
        let mut mappings = PathMap::new();

        for plugin in env.plugins.items() {
            for (key, target) in &plugin.static_maps {
                let prefix = format!("/src/{}", key.trim_matches('/'));
                mappings.insert(prefix, root.join(target));
            }
        }
        for plugin in env.plugins.items() {
            let base = root.join(&plugin.path);
            mappings.insert(format!("/src/{}", plugin.name), base.join("src"));
            mappings.insert(format!("/web/{}", plugin.name), base.join("web"));
        }
        tracing::info!(mappings = mappings.len(), "Static handler ready");

        let roots = StaticRoots {
            web_root: env.paths.web_root(),
            src_root: env.paths.src_root(),
            index_name: env.paths.index_name.clone(),
        };
        Ok(Arc::new(StaticFileHandler::new(env.realms.clone(), mappings, roots)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler(mappings: PathMap) -> StaticFileHandler {
        StaticFileHandler::new(
            Arc::new(RealmRegistry::new(["admin"])),
            mappings,
            StaticRoots {
                web_root: PathBuf::from("/srv/web"),
                src_root: PathBuf::from("/srv/src"),
                index_name: "index.html".to_string(),
            },
        )
    }

    #[test]
    fn web_directories_get_index() {
        let h = handler(PathMap::new());
        assert_eq!(
            h.resolve_path("/web/myapp/"),
            Some(PathBuf::from("/srv/web/myapp/index.html"))
        );
        assert_eq!(h.resolve_path("/"), Some(PathBuf::from("/srv/web/index.html")));
    }

    #[test]
    fn source_paths_never_get_index() {
        let h = handler(PathMap::new());
        assert_eq!(
            h.resolve_path("/src/myapp/file.js"),
            Some(PathBuf::from("/srv/src/myapp/file.js"))
        );
        assert_eq!(h.resolve_path("/src/myapp/"), Some(PathBuf::from("/srv/src/myapp")));
    }

    #[test]
    fn realm_is_stripped() {
        let h = handler(PathMap::new());
        assert_eq!(
            h.resolve_path("/admin/web/panel.css"),
            Some(PathBuf::from("/srv/web/panel.css"))
        );
    }

    #[test]
    fn mapped_prefix_is_used() {
        let mut map = PathMap::new();
        map.insert("/src/vendor/lib", "/opt/lib");
        let h = handler(map);
        assert_eq!(
            h.resolve_path("/src/vendor/lib/index.js"),
            Some(PathBuf::from("/opt/lib/index.js"))
        );
    }

    #[test]
    fn parent_segments_are_declined() {
        let h = handler(PathMap::new());
        assert_eq!(h.resolve_path("/web/../etc/passwd"), None);
    }
}
