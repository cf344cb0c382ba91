//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, config_handler, delete_handler, entry_info_handler, get_handler, has_handler,
    health_handler, keys_handler, policy_handler, set_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /set` - Store a key-value pair
/// - `GET /get/:key` - Retrieve a value by key
/// - `GET /has/:key` - Check a key without counting a lookup
/// - `DELETE /del/:key` - Delete a key
/// - `GET /keys` - Snapshot of live keys
/// - `POST /clear` - Remove every entry
/// - `GET /stats` - Get cache statistics
/// - `GET /entry/:key` - Entry metadata
/// - `PUT /policy` - Change the eviction policy
/// - `PATCH /config` - Partially update the cache configuration
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/set", put(set_handler))
        .route("/get/:key", get(get_handler))
        .route("/has/:key", get(has_handler))
        .route("/del/:key", delete(delete_handler))
        .route("/keys", get(keys_handler))
        .route("/clear", post(clear_handler))
        .route("/stats", get(stats_handler))
        .route("/entry/:key", get(entry_info_handler))
        .route("/policy", put(policy_handler))
        .route("/config", patch(config_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
