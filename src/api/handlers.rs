//! API Handlers
//!
//! HTTP request handlers for each store endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tokio::task;
use tracing::warn;

use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, SetRequest, SetResponse, StatsResponse,
};
use crate::store::{DeleteOutcome, KvStore};

/// Application state shared across all handlers.
///
/// The store does its own locking, so handlers share it through an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Durable key-value store
    pub store: Arc<KvStore>,
}

impl AppState {
    /// Creates a new AppState around an opened store.
    pub fn new(store: KvStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Opens the store described by the configuration, running recovery.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(KvStore::open(config)?))
    }

    /// Closes the store once the server has stopped.
    ///
    /// Returns `true` if the store was closed. If another handle is still
    /// alive the log is only flushed and `false` is returned.
    pub fn close(self) -> Result<bool> {
        match Arc::try_unwrap(self.store) {
            Ok(store) => store.close().map(|_| true),
            Err(store) => {
                warn!("Store still shared at shutdown, flushing without closing");
                store.flush().map(|_| false)
            }
        }
    }
}

/// Runs a store call on the blocking pool; WAL appends may fsync.
async fn blocking<T, F>(state: &AppState, op: F) -> Result<T>
where
    F: FnOnce(&KvStore) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(&state.store);
    task::spawn_blocking(move || op(&store))
        .await
        .map_err(|e| CacheError::Internal(format!("store task failed: {}", e)))?
}

/// Handler for POST /set
///
/// Stores a key-value pair. Responds only after the WAL append succeeded.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let key = req.key.clone();
    blocking(&state, move |store| store.set(req.key, req.value)).await?;

    Ok(Json(SetResponse::new(key)))
}

/// Handler for GET /get/:key
///
/// Retrieves a value by key.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let lookup = key.clone();
    let value = blocking(&state, move |store| Ok(store.get(&lookup))).await?;

    match value {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /delete/:key
///
/// Deletes a key from the store.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let target = key.clone();
    let outcome = blocking(&state, move |store| store.delete(&target)).await?;

    match outcome {
        DeleteOutcome::Deleted => Ok(Json(DeleteResponse::new(key))),
        DeleteOutcome::NotFound => Err(CacheError::NotFound(key)),
    }
}

/// Handler for GET /stats
///
/// Returns current store statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let response = blocking(&state, |store| {
        Ok(StatsResponse::new(&store.stats(), store.capacity(), store.uptime()))
    })
    .await?;
    Ok(Json(response))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
