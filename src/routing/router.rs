//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store the ordered route table
//! - Look up the matching rule for a request target
//! - Apply the rule's path rewrite
//! - Decide which upgrade requests are relayed
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Ordered Vec, O(n) scan: first match wins
//! - Explicit None rather than a silent default when a hand-built table lacks
//!   a catch-all

use std::borrow::Cow;

use crate::config::RoutingConfig;
use crate::routing::matcher::{
    AnyMatcher, CatchAllMatcher, ContainsMatcher, Matcher, PathPrefixMatcher, PrefixSetMatcher,
    SegmentMatcher,
};
use crate::upstream::{Upstream, Upstreams};

/// Transformation applied to the target before forwarding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    /// Forward the target as received.
    None,
    /// Remove a leading prefix. `/app` → `/`, `/app/x` → `/x`, `/app?q` → `/?q`.
    StripPrefix(String),
}

impl Rewrite {
    pub fn apply<'a>(&self, target: &'a str) -> Cow<'a, str> {
        match self {
            Rewrite::None => Cow::Borrowed(target),
            Rewrite::StripPrefix(prefix) => match target.strip_prefix(prefix.as_str()) {
                Some("") => Cow::Borrowed("/"),
                Some(rest) if rest.starts_with('?') => Cow::Owned(format!("/{}", rest)),
                Some(rest) => Cow::Borrowed(rest),
                None => Cow::Borrowed(target),
            },
        }
    }
}

/// A single entry of the route table.
#[derive(Debug)]
pub struct RouteRule {
    /// Rule identifier for logging/metrics.
    pub name: String,
    pub matcher: Box<dyn Matcher>,
    pub upstream: Upstream,
    pub rewrite: Rewrite,
}

impl RouteRule {
    pub fn new(
        name: impl Into<String>,
        matcher: impl Matcher + 'static,
        upstream: Upstream,
        rewrite: Rewrite,
    ) -> Self {
        Self {
            name: name.into(),
            matcher: Box::new(matcher),
            upstream,
            rewrite,
        }
    }
}

/// Which upgrade requests are relayed, and where.
#[derive(Debug)]
pub struct UpgradePolicy {
    matcher: Box<dyn Matcher>,
    upstream: Upstream,
}

impl UpgradePolicy {
    pub fn new(matcher: impl Matcher + 'static, upstream: Upstream) -> Self {
        Self {
            matcher: Box::new(matcher),
            upstream,
        }
    }
}

/// Outcome of a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub rule: &'a str,
    pub upstream: &'a Upstream,
    /// Target to send upstream, after rewriting.
    pub target: Cow<'a, str>,
}

/// Immutable, ordered route table.
#[derive(Debug)]
pub struct Router {
    rules: Vec<RouteRule>,
    upgrade: UpgradePolicy,
}

impl Router {
    /// Build the gateway's route table:
    /// api prefix → api, app mount → app (stripped), assets → app,
    /// everything else → site.
    pub fn from_config(config: &RoutingConfig, upstreams: &Upstreams) -> Self {
        let rules = vec![
            RouteRule::new(
                "api",
                PathPrefixMatcher::new(config.api_prefix.as_str()),
                upstreams.api.clone(),
                Rewrite::None,
            ),
            RouteRule::new(
                "app",
                SegmentMatcher::new(config.app_prefix.as_str()),
                upstreams.app.clone(),
                Rewrite::StripPrefix(config.app_prefix.clone()),
            ),
            RouteRule::new(
                "assets",
                PrefixSetMatcher::new(config.asset_prefixes.iter().cloned()),
                upstreams.app.clone(),
                Rewrite::None,
            ),
            RouteRule::new("site", CatchAllMatcher, upstreams.site.clone(), Rewrite::None),
        ];

        let mut upgrade_matchers: Vec<Box<dyn Matcher>> =
            vec![Box::new(SegmentMatcher::new(config.app_prefix.as_str()))];
        upgrade_matchers.extend(
            config
                .upgrade_markers
                .iter()
                .map(|m| Box::new(ContainsMatcher::new(m.as_str())) as Box<dyn Matcher>),
        );
        let upgrade = UpgradePolicy::new(AnyMatcher::new(upgrade_matchers), upstreams.app.clone());

        Self::from_rules(rules, upgrade)
    }

    /// Build a router from an explicit rule list, evaluated in order.
    pub fn from_rules(rules: Vec<RouteRule>, upgrade: UpgradePolicy) -> Self {
        Self { rules, upgrade }
    }

    /// Find the first rule matching `target`.
    pub fn route<'a>(&'a self, target: &'a str) -> Option<RouteMatch<'a>> {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(target))
            .map(|rule| RouteMatch {
                rule: &rule.name,
                upstream: &rule.upstream,
                target: rule.rewrite.apply(target),
            })
    }

    /// Resolve an upgrade request. `None` means the upgrade is refused.
    /// Relayed upgrades keep their target unmodified.
    pub fn route_upgrade<'a>(&'a self, target: &'a str) -> Option<RouteMatch<'a>> {
        self.upgrade.matcher.matches(target).then(|| RouteMatch {
            rule: "upgrade",
            upstream: &self.upgrade.upstream,
            target: Cow::Borrowed(target),
        })
    }

    /// Whether every target is guaranteed to match some rule.
    pub fn is_total(&self) -> bool {
        self.rules.iter().any(|rule| rule.matcher.is_catch_all())
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }
}
