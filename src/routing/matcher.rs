//! Route matching logic.
//!
//! # Responsibilities
//! - Match path prefix (case-sensitive, literal)
//! - Apply the rule's path rewrite
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Prefix matching is literal; regex is only used for rewriting
//! - A rewrite whose pattern finds nothing leaves the path untouched

use std::borrow::Cow;

use regex::Regex;

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Returns true if `path` starts with this prefix.
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// What a rewrite did to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// The pattern matched and the path was replaced.
    Rewritten,
    /// The rule has a rewrite but its pattern did not match.
    NoOp,
    /// The rule has no rewrite.
    Unchanged,
}

/// First-match regex substitution on a request path.
#[derive(Debug, Clone)]
pub struct PathRewrite {
    pattern: Regex,
    replacement: String,
}

impl PathRewrite {
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement: replacement.into(),
        })
    }

    /// Replace the first match of the pattern in `path`.
    ///
    /// Borrows `path` untouched when the pattern does not match.
    pub fn apply<'a>(&self, path: &'a str) -> (Cow<'a, str>, RewriteOutcome) {
        match self.pattern.replace(path, self.replacement.as_str()) {
            Cow::Borrowed(unchanged) => (Cow::Borrowed(unchanged), RewriteOutcome::NoOp),
            rewritten => (rewritten, RewriteOutcome::Rewritten),
        }
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }
}
