//! Route matching logic.
//!
//! # Responsibilities
//! - Match the request target (path plus query, as received)
//! - Prefix, whole-segment, substring and catch-all conditions
//! - Combine conditions with OR semantics
//!
//! # Design Decisions
//! - Matching is case-sensitive
//! - No regex to guarantee O(n) matching

/// Trait for matching request targets against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the target matches this condition.
    fn matches(&self, target: &str) -> bool;

    /// True when the matcher accepts every target.
    fn is_catch_all(&self) -> bool {
        false
    }
}

/// Matches targets starting with a fixed string.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, target: &str) -> bool {
        target.starts_with(&self.prefix)
    }
}

/// Matches a mount point: the prefix itself, or the prefix followed by `/`
/// or a query string. `/app` matches `/app/x` and `/app?x` but not `/apple`.
#[derive(Debug, Clone)]
pub struct SegmentMatcher {
    prefix: String,
}

impl SegmentMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Matcher for SegmentMatcher {
    fn matches(&self, target: &str) -> bool {
        match target.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
            None => false,
        }
    }
}

/// Matches when any of several prefixes matches.
#[derive(Debug, Clone)]
pub struct PrefixSetMatcher {
    prefixes: Vec<String>,
}

impl PrefixSetMatcher {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }
}

impl Matcher for PrefixSetMatcher {
    fn matches(&self, target: &str) -> bool {
        self.prefixes.iter().any(|p| target.starts_with(p.as_str()))
    }
}

/// Matches targets containing a marker anywhere, query included.
#[derive(Debug, Clone)]
pub struct ContainsMatcher {
    marker: String,
}

impl ContainsMatcher {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl Matcher for ContainsMatcher {
    fn matches(&self, target: &str) -> bool {
        target.contains(self.marker.as_str())
    }
}

/// Accepts everything. Used for the fallback rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatchAllMatcher;

impl Matcher for CatchAllMatcher {
    fn matches(&self, _target: &str) -> bool {
        true
    }

    fn is_catch_all(&self) -> bool {
        true
    }
}

/// Combines multiple matchers with OR semantics.
#[derive(Debug)]
pub struct AnyMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AnyMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AnyMatcher {
    fn matches(&self, target: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(target))
    }

    fn is_catch_all(&self) -> bool {
        self.matchers.iter().any(|m| m.is_catch_all())
    }
}
