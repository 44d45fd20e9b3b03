//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, query)
//!     → router.rs (first rule whose prefix matches)
//!     → matcher.rs (prefix test, path rewrite)
//!     → Return: matched Rule + upstream URL, or None
//!
//! Rule Compilation (at startup):
//!     RuleConfig[]
//!     → Compile prefix matchers and rewrite regexes
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - No regex in the match path (prefix matching only)
//! - Deterministic: same input always matches same rule
//! - First match wins (declaration order)

pub mod matcher;
pub mod router;

pub use matcher::{PathPrefixMatcher, PathRewrite, RewriteOutcome};
pub use router::{Rule, Router, RuleError};
