//! HTTP handlers.
//!
//! Every tenant-scoped route takes the already-authenticated caller as the
//! `owner_id` query parameter.

pub mod bookmarks;
pub mod tags;

use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use uuid::Uuid;

use tagstack_core::OwnerId;
use tagstack_db::log_pool_metrics;

use crate::AppState;

/// `?owner_id=<uuid>`
#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub owner_id: Uuid,
}

impl OwnerQuery {
    pub fn owner(&self) -> OwnerId {
        OwnerId::new(self.owner_id)
    }
}

/// Liveness plus storage backend. With PostgreSQL, pool size and idle
/// count are logged and reported.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let storage = match &state.pool {
        Some(pool) => {
            log_pool_metrics(pool);
            serde_json::json!({
                "backend": "postgres",
                "pool_size": pool.size(),
                "pool_idle": pool.num_idle(),
            })
        }
        None => serde_json::json!({ "backend": "memory" }),
    };
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage,
    }))
}
