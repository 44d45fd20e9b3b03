//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate rule prefixes, upstream targets and rewrite patterns
//! - Flag rules that are shadowed or whose rewrite can never fire
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Lint findings are warnings; the literal config is still honored

use std::collections::HashSet;
use std::net::SocketAddr;

use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::config::schema::{ProxyConfig, RuleConfig};

/// A semantic error in the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid {field} address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("rule '{0}': name must not be empty")]
    EmptyName(String),

    #[error("duplicate rule name '{0}'")]
    DuplicateName(String),

    #[error("rule '{rule}': prefix '{prefix}' must start with '/'")]
    InvalidPrefix { rule: String, prefix: String },

    #[error("rule '{rule}': invalid target '{target}': {reason}")]
    InvalidTarget {
        rule: String,
        target: String,
        reason: String,
    },

    #[error("rule '{rule}': invalid rewrite pattern: {reason}")]
    InvalidPattern { rule: String, reason: String },

    #[error("limits.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,
}

/// A configuration that is valid but probably not what was meant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleWarning {
    /// An earlier rule's prefix covers this rule's prefix, so it never matches.
    #[error("rule '{rule}' is shadowed by earlier rule '{by}' and never matches")]
    Shadowed { rule: String, by: String },

    /// The rewrite pattern does not match the rule's own prefix.
    #[error("rule '{rule}': rewrite pattern '{pattern}' does not match the rule prefix; the rewrite is likely a no-op")]
    RewriteMissesPrefix { rule: String, pattern: String },
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
    }
    if config.observability.metrics_enabled {
        check_socket_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    let mut names = HashSet::new();
    for rule in &config.rules {
        if rule.name.trim().is_empty() {
            errors.push(ValidationError::EmptyName(rule.prefix.clone()));
        } else if !names.insert(rule.name.as_str()) {
            errors.push(ValidationError::DuplicateName(rule.name.clone()));
        }
        validate_rule(rule, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Accepts `ip:port` or `host:port`, the forms `TcpListener::bind` resolves.
fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let valid = value.parse::<SocketAddr>().is_ok()
        || value
            .rsplit_once(':')
            .is_some_and(|(host, port)| is_hostname(host) && port.parse::<u16>().is_ok());
    if !valid {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn is_hostname(host: &str) -> bool {
    !host.is_empty()
        && host
            .split('.')
            .all(|label| !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'))
}

/// The metrics exporter takes a resolved address, so no hostnames there.
fn check_socket_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn validate_rule(rule: &RuleConfig, errors: &mut Vec<ValidationError>) {
    if !rule.prefix.starts_with('/') {
        errors.push(ValidationError::InvalidPrefix {
            rule: rule.name.clone(),
            prefix: rule.prefix.clone(),
        });
    }

    if let Err(reason) = check_target(&rule.target) {
        errors.push(ValidationError::InvalidTarget {
            rule: rule.name.clone(),
            target: rule.target.clone(),
            reason,
        });
    }

    if let Some(rewrite) = &rule.rewrite {
        if let Err(e) = Regex::new(&rewrite.pattern) {
            errors.push(ValidationError::InvalidPattern {
                rule: rule.name.clone(),
                reason: e.to_string(),
            });
        }
    }
}

/// A target is an absolute http(s) URL with a host and no path beyond `/`.
pub(crate) fn check_target(target: &str) -> Result<Url, String> {
    let url = Url::parse(target).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.path() != "/" {
        return Err("target must not carry a path".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("target must not carry a query or fragment".to_string());
    }
    Ok(url)
}

/// Report rules that are legal but will not behave as their config suggests.
pub fn lint_rules(rules: &[RuleConfig]) -> Vec<RuleWarning> {
    let mut warnings = Vec::new();

    for (i, rule) in rules.iter().enumerate() {
        if let Some(earlier) = rules[..i]
            .iter()
            .find(|earlier| rule.prefix.starts_with(&earlier.prefix))
        {
            warnings.push(RuleWarning::Shadowed {
                rule: rule.name.clone(),
                by: earlier.name.clone(),
            });
        }

        if let Some(rewrite) = &rule.rewrite {
            if let Ok(re) = Regex::new(&rewrite.pattern) {
                if !re.is_match(&rule.prefix) {
                    warnings.push(RuleWarning::RewriteMissesPrefix {
                        rule: rule.name.clone(),
                        pattern: rewrite.pattern.clone(),
                    });
                }
            }
        }
    }

    warnings
}
