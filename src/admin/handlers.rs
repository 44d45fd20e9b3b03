use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::routing::Rule;

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
    pub rules: usize,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RewriteStatus {
    pub pattern: String,
    pub replacement: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleStatus {
    pub name: String,
    pub prefix: String,
    pub target: String,
    pub rewrite: Option<RewriteStatus>,
    pub change_origin: bool,
    pub forwarded_headers: bool,
}

impl From<&Rule> for RuleStatus {
    fn from(rule: &Rule) -> Self {
        Self {
            name: rule.name().to_string(),
            prefix: rule.prefix().to_string(),
            target: rule.target().to_string(),
            rewrite: rule.rewrite().map(|r| RewriteStatus {
                pattern: r.pattern().to_string(),
                replacement: r.replacement().to_string(),
            }),
            change_origin: rule.change_origin(),
            forwarded_headers: rule.forwarded_headers(),
        }
    }
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
        rules: state.router.len(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

/// Rules in match order.
pub async fn get_rules(State(state): State<AdminState>) -> Json<Vec<RuleStatus>> {
    Json(state.router.rules().iter().map(RuleStatus::from).collect())
}
