//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `PUT /set` - Store a JSON value
//! - `GET /get/:key` - Retrieve a value, reading through to the remote store
//! - `DELETE /del/:key` - Remove a key locally
//! - `DELETE /clear` - Remove every local entry
//! - `GET /stats` - Get cache statistics
//! - `PUT /remote` - Bring the remote link up or down
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
