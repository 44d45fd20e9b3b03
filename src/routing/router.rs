//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled rules in declaration order
//! - Look up the first rule whose prefix matches the request path
//! - Build the upstream URL for a matched rule
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) prefix scan (acceptable for typical rule counts)
//! - Explicit None rather than silent default

use std::borrow::Cow;

use thiserror::Error;
use url::Url;

use crate::config::validation::check_target;
use crate::config::RuleConfig;
use crate::routing::matcher::{PathPrefixMatcher, PathRewrite, RewriteOutcome};

/// Error compiling a rule from configuration.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule '{rule}': invalid target: {reason}")]
    InvalidTarget { rule: String, reason: String },

    #[error("rule '{rule}': invalid rewrite pattern: {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled forwarding rule.
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    matcher: PathPrefixMatcher,
    target: String,
    rewrite: Option<PathRewrite>,
    change_origin: bool,
    forwarded_headers: bool,
}

impl Rule {
    /// Compile a rule from its configuration.
    pub fn from_config(config: &RuleConfig) -> Result<Self, RuleError> {
        check_target(&config.target).map_err(|reason| RuleError::InvalidTarget {
            rule: config.name.clone(),
            reason,
        })?;

        let rewrite = config
            .rewrite
            .as_ref()
            .map(|r| PathRewrite::new(&r.pattern, r.replacement.clone()))
            .transpose()
            .map_err(|source| RuleError::InvalidPattern {
                rule: config.name.clone(),
                source,
            })?;

        Ok(Self {
            name: config.name.clone(),
            matcher: PathPrefixMatcher::new(config.prefix.clone()),
            target: config.target.clone(),
            rewrite,
            change_origin: config.change_origin,
            forwarded_headers: config.forwarded_headers,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> &str {
        self.matcher.prefix()
    }

    /// Upstream base URL as configured.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn rewrite(&self) -> Option<&PathRewrite> {
        self.rewrite.as_ref()
    }

    /// Whether the outbound Host header is set to the upstream's host.
    pub fn change_origin(&self) -> bool {
        self.change_origin
    }

    pub fn forwarded_headers(&self) -> bool {
        self.forwarded_headers
    }

    pub fn matches(&self, path: &str) -> bool {
        self.matcher.matches(path)
    }

    /// Apply this rule's rewrite to `path`.
    pub fn rewrite_path<'a>(&self, path: &'a str) -> (Cow<'a, str>, RewriteOutcome) {
        match &self.rewrite {
            Some(rewrite) => rewrite.apply(path),
            None => (Cow::Borrowed(path), RewriteOutcome::Unchanged),
        }
    }

    /// Join the target with an already rewritten path and the original query.
    ///
    /// The join is textual: a `/` is inserted only when neither side has one,
    /// so a target ending in `/` followed by a path starting with `/` keeps both.
    pub fn upstream_url(&self, path: &str, query: Option<&str>) -> Result<Url, url::ParseError> {
        let mut url = String::with_capacity(self.target.len() + path.len() + 1);
        url.push_str(&self.target);
        if !self.target.ends_with('/') && !path.starts_with('/') {
            url.push('/');
        }
        url.push_str(path);
        if let Some(query) = query {
            url.push('?');
            url.push_str(query);
        }
        Url::parse(&url)
    }
}

/// Ordered, immutable rule table.
#[derive(Debug, Clone, Default)]
pub struct Router {
    rules: Vec<Rule>,
}

impl Router {
    /// Compile all rules, keeping declaration order.
    pub fn from_config(rules: &[RuleConfig]) -> Result<Self, RuleError> {
        let rules = rules
            .iter()
            .map(Rule::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// First rule whose prefix matches `path`.
    pub fn match_path(&self, path: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.matches(path))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RewriteConfig;

    const HOOK_ID: &str = "a7c289d5-5b98-4105-b456-8e69fdaa1ea5";

    fn rule(name: &str, prefix: &str, target: &str, rewrite: Option<(&str, &str)>) -> RuleConfig {
        RuleConfig {
            name: name.into(),
            prefix: prefix.into(),
            target: target.into(),
            rewrite: rewrite.map(|(pattern, replacement)| RewriteConfig {
                pattern: pattern.into(),
                replacement: replacement.into(),
            }),
            change_origin: true,
            forwarded_headers: false,
        }
    }

    fn webhook_router() -> Router {
        let generate = format!("webhook/{}", HOOK_ID);
        let publish = format!("/webhook-test/{}", HOOK_ID);
        Router::from_config(&[
            rule(
                "send-email",
                "/api/send-email",
                "https://hooks.example.com/",
                Some(("^/api/generate", generate.as_str())),
            ),
            rule(
                "send-email-prod",
                "/api/send-email-prod",
                "https://hooks.example.com/",
                Some(("^/api/publish", publish.as_str())),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn unmatched_path_returns_none() {
        let router = webhook_router();
        assert!(router.match_path("/assets/app.js").is_none());
        assert!(router.match_path("/api").is_none());
    }

    #[test]
    fn first_declared_rule_wins() {
        let router = Router::from_config(&[
            rule("first", "/api", "http://127.0.0.1:1", None),
            rule("second", "/api", "http://127.0.0.1:2", None),
        ])
        .unwrap();
        assert_eq!(router.match_path("/api/x").unwrap().name(), "first");

        // The longer prefix declared later never wins either.
        let router = webhook_router();
        assert_eq!(router.match_path("/api/send-email-prod/x").unwrap().name(), "send-email");
    }

    #[test]
    fn dead_rewrite_forwards_original_path() {
        let router = webhook_router();
        let rule = router.match_path("/api/send-email/foo").unwrap();

        let (path, outcome) = rule.rewrite_path("/api/send-email/foo");
        assert_eq!(path, "/api/send-email/foo");
        assert_eq!(outcome, RewriteOutcome::NoOp);

        let url = rule.upstream_url(&path, None).unwrap();
        assert_eq!(url.as_str(), "https://hooks.example.com//api/send-email/foo");
    }

    #[test]
    fn publish_rewrite_targets_test_webhook() {
        let router = webhook_router();
        let rule = &router.rules()[1];

        let (path, outcome) = rule.rewrite_path("/api/publish/x");
        assert_eq!(path, format!("/webhook-test/{}/x", HOOK_ID));
        assert_eq!(outcome, RewriteOutcome::Rewritten);
    }

    #[test]
    fn generate_rewrite_joins_without_double_slash() {
        let router = webhook_router();
        let rule = &router.rules()[0];

        let (path, _) = rule.rewrite_path("/api/generate");
        let url = rule.upstream_url(&path, Some("debug=1")).unwrap();
        assert_eq!(
            url.as_str(),
            format!("https://hooks.example.com/webhook/{}?debug=1", HOOK_ID)
        );
    }

    #[test]
    fn rule_without_rewrite_is_unchanged() {
        let router = Router::from_config(&[rule("api", "/api", "http://127.0.0.1:3000", None)]).unwrap();
        let rule = router.match_path("/api/users").unwrap();
        let (path, outcome) = rule.rewrite_path("/api/users");
        assert_eq!(path, "/api/users");
        assert_eq!(outcome, RewriteOutcome::Unchanged);
        assert_eq!(
            rule.upstream_url(&path, None).unwrap().as_str(),
            "http://127.0.0.1:3000/api/users"
        );
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = Router::from_config(&[rule("bad", "/bad", "http://127.0.0.1:3000", Some(("(", "")))])
            .unwrap_err();
        assert!(matches!(err, RuleError::InvalidPattern { .. }));
    }
}
