//! Read-only admin API.
//!
//! Serves `/admin/status` and `/admin/rules` on its own listener so the
//! proxied path space stays untouched.

pub mod auth;
pub mod handlers;

use std::sync::Arc;
use std::time::Instant;

use axum::{middleware, routing::get, Router};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::routing::Router as ProxyRouter;

/// Shared state for admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub router: Arc<ProxyRouter>,
    pub api_key: Option<Arc<str>>,
    pub started_at: Instant,
}

impl AdminState {
    pub fn new(router: Arc<ProxyRouter>, api_key: Option<String>) -> Self {
        Self {
            router,
            api_key: api_key.map(Arc::from),
            started_at: Instant::now(),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/rules", get(get_rules))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
