//! Prefix table lookup.
//!
//! # Responsibilities
//! - Store virtual prefix → filesystem root mappings
//! - Rewrite a matching path onto its filesystem root
//! - Return explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) prefix scan (acceptable for typical plugin counts)
//! - First registered match wins

use std::path::{Path, PathBuf};

use crate::routing::matcher::{Matcher, PathPrefixMatcher};

/// Ordered virtual-prefix → directory mappings.
#[derive(Debug, Clone, Default)]
pub struct PathMap {
    entries: Vec<(PathPrefixMatcher, PathBuf)>,
}

impl PathMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mapping. Overlaps with earlier prefixes are reported, not rejected.
    pub fn insert(&mut self, prefix: impl Into<String>, root: impl Into<PathBuf>) {
        let matcher = PathPrefixMatcher::new(prefix);
        let root = root.into();
        for (existing, existing_root) in &self.entries {
            if existing.overlaps(&matcher) {
                tracing::warn!(
                    first = %existing.prefix(),
                    first_root = %existing_root.display(),
                    second = %matcher.prefix(),
                    "Overlapping static prefixes; first registered wins"
                );
            }
        }
        tracing::debug!(prefix = %matcher.prefix(), root = %root.display(), "Static mapping");
        self.entries.push((matcher, root));
    }

    /// Rewrite `path` onto the first matching root, collapsing empty segments.
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        self.entries.iter().find_map(|(matcher, root)| {
            matcher.strip(path).map(|tail| join_segments(root, tail))
        })
    }

    /// Registered prefixes in lookup order.
    pub fn prefixes(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries.iter().map(|(m, root)| (m.prefix(), root.as_path()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `root` + every non-empty segment of `tail`.
pub(crate) fn join_segments(root: &Path, tail: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    for segment in tail.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path
}
