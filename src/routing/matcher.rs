//! Path matching logic.
//!
//! # Responsibilities
//! - Match a normalized path against a registered prefix
//! - Respect path segment boundaries
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - No regex to guarantee O(n) matching

/// Trait for matching paths against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns the unmatched remainder when the path matches this condition.
    fn strip<'a>(&self, path: &'a str) -> Option<&'a str>;

    /// Returns true if the path matches this condition.
    fn matches(&self, path: &str) -> bool {
        self.strip(path).is_some()
    }
}

/// Matches a path prefix on segment boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher. A trailing '/' is ignored.
    pub fn new(prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        while prefix.len() > 1 && prefix.ends_with('/') {
            prefix.pop();
        }
        Self { prefix }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// True when every path this matcher accepts is also accepted by `other`, or vice versa.
    pub fn overlaps(&self, other: &PathPrefixMatcher) -> bool {
        self.matches(&other.prefix) || other.matches(&self.prefix)
    }
}

impl Matcher for PathPrefixMatcher {
    fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        let tail = path.strip_prefix(self.prefix.as_str())?;
        if tail.is_empty() || tail.starts_with('/') || self.prefix == "/" {
            Some(tail)
        } else {
            None
        }
    }
}
