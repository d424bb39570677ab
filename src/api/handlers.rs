//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::cache::LruCache;
use crate::codec::JsonCodec;
use crate::config::Config;
use crate::error::{ApiError, ConfigError, Result};
use crate::models::{
    ClearResponse, DeleteResponse, GetResponse, HealthResponse, RemoteRequest, RemoteResponse,
    SetRequest, SetResponse, StatsResponse,
};
use crate::remote::{MemoryRemote, RemoteStore};

/// Application state shared across all handlers.
///
/// The cache synchronizes internally, so handlers share it by cloning.
#[derive(Clone)]
pub struct AppState {
    /// JSON-valued cache
    pub cache: LruCache<Value>,
    /// Remote store behind the cache
    pub remote: Arc<MemoryRemote>,
}

impl AppState {
    /// Creates a new AppState around an existing cache and its remote.
    pub fn new(cache: LruCache<Value>, remote: Arc<MemoryRemote>) -> Self {
        Self { cache, remote }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn from_config(config: &Config) -> std::result::Result<Self, ConfigError> {
        let remote = Arc::new(MemoryRemote::new());
        remote.set_active(config.remote_enabled);

        let cache = LruCache::builder()
            .config(&config.cache_config())
            .codec(JsonCodec)
            .remote(remote.clone())
            .build()?;
        Ok(Self::new(cache, remote))
    }
}

/// Handler for PUT /set
///
/// Stores a JSON value in the cache; it is written through to the remote
/// store when the link is up.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    state.cache.set(req.key.clone(), req.value).await;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
///
/// Retrieves a value, reading through to the remote store on a local miss.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let deferred = state
        .cache
        .get(&key)
        .await
        .ok_or_else(|| ApiError::NotFound(key.clone()))?;

    let value = deferred
        .wait()
        .await
        .ok_or_else(|| ApiError::Unresolved(key.clone()))?;

    let info = state.cache.entry_info(&key).await;
    Ok(Json(GetResponse::new(key, value).with_info(info)))
}

/// Handler for DELETE /del/:key
///
/// Removes a key from the local cache. The remote copy is left alone.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    state
        .cache
        .pop(&key)
        .await
        .ok_or_else(|| ApiError::NotFound(key.clone()))?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for DELETE /clear
///
/// Empties the local cache.
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let cleared = state.cache.len().await;
    state.cache.clear(None).await;

    Json(ClearResponse::new(cleared))
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(state.cache.stats().await))
}

/// Handler for PUT /remote
///
/// Brings the remote link up or down.
pub async fn remote_handler(
    State(state): State<AppState>,
    Json(req): Json<RemoteRequest>,
) -> Json<RemoteResponse> {
    state.remote.set_active(req.active);

    Json(RemoteResponse {
        active: state.remote.is_active(),
    })
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.remote.is_active()))
}
