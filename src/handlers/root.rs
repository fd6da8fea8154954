use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use serde_json::{json, Value};

use crate::database::Database;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::table::TableRegistry;

/// Shared by the process-level routes.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub tables: Arc<TableRegistry>,
    pub project_name: String,
    pub started: Instant,
}

/// GET / - service identity and exposed tables
pub async fn root(State(state): State<AppState>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "name": state.project_name,
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.started.elapsed().as_secs(),
        "tables": state.tables.names(),
    })))
}

/// GET /health - database ping
pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    let now = chrono::Utc::now();

    match state.db.ping().await {
        Ok(()) => Ok(ApiResponse::success(json!({
            "status": "ok",
            "timestamp": now,
            "database": "ok",
        }))),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            Err(ApiError::service_unavailable("database unavailable"))
        }
    }
}

/// Any path no router claimed.
pub async fn fallback(uri: axum::http::Uri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}
