//! API Handlers
//!
//! HTTP request handlers exposing the cache's public operations.

use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::cache::{Cache, CacheStats, EntryInfo};
use crate::config::{CacheConfig, ConfigUpdate};
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, GetResponse, HasResponse, HealthResponse, KeysResponse, PolicyRequest,
    PolicyResponse, SetRequest, SetResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared cache holding JSON values
    pub cache: Cache<Value>,
}

impl AppState {
    /// Creates a new AppState around an existing cache handle.
    pub fn new(cache: Cache<Value>) -> Self {
        Self { cache }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &crate::config::Config) -> Result<Self> {
        Ok(Self::new(Cache::new(config.cache.clone())?))
    }
}

/// Handler for PUT /set
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl_ms.map(Duration::from_millis);
    if !state.cache.set(req.key.clone(), req.value, ttl).await {
        return Err(CacheError::InvalidRequest(format!(
            "Value for key '{}' is larger than the cache memory limit",
            req.key
        )));
    }

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value = state.cache.get(&key).await;
    match value {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for GET /has/:key
pub async fn has_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<HasResponse> {
    let exists = state.cache.has(&key).await;
    Json(HasResponse { key, exists })
}

/// Handler for DELETE /del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if state.cache.delete(&key).await {
        Ok(Json(DeleteResponse::new(key)))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for GET /keys
pub async fn keys_handler(State(state): State<AppState>) -> Json<KeysResponse> {
    Json(KeysResponse::new(state.cache.keys().await))
}

/// Handler for POST /clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<CacheStats> {
    state.cache.clear().await;
    Json(state.cache.stats().await)
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats().await)
}

/// Handler for GET /entry/:key
pub async fn entry_info_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<EntryInfo>> {
    let info = state.cache.entry_info(&key).await;
    info.map(Json).ok_or(CacheError::NotFound(key))
}

/// Handler for PUT /policy
pub async fn policy_handler(
    State(state): State<AppState>,
    Json(req): Json<PolicyRequest>,
) -> Result<Json<PolicyResponse>> {
    state.cache.set_policy_by_name(&req.policy).await?;
    Ok(Json(PolicyResponse {
        policy: state.cache.config().await.policy,
    }))
}

/// Handler for PATCH /config
pub async fn config_handler(
    State(state): State<AppState>,
    Json(update): Json<ConfigUpdate>,
) -> Result<Json<CacheConfig>> {
    if update.is_empty() {
        return Err(CacheError::InvalidRequest(
            "Config update must set at least one field".to_string(),
        ));
    }
    state.cache.update_config(update).await?;
    Ok(Json(state.cache.config().await))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
