//! API Module
//!
//! HTTP handlers and routing exposing the cache over a small REST surface.
//!
//! # Endpoints
//! - `PUT /set` - Store a key-value pair
//! - `GET /get/:key` - Retrieve a value by key
//! - `GET /has/:key` - Existence check
//! - `DELETE /del/:key` - Delete a key
//! - `GET /keys` - List live keys
//! - `POST /clear` - Clear the cache
//! - `GET /stats` - Get cache statistics
//! - `GET /entry/:key` - Entry metadata
//! - `PUT /policy` - Change eviction policy
//! - `PATCH /config` - Update configuration
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
