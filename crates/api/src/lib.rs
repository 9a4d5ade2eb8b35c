//! HTTP API layer for memento.
//!
//! Every endpoint is a `POST`. Plain requests carry a JSON body; uploads
//! are `multipart/form-data`. Successful responses are wrapped as
//! `{"data": ...}`, errors as `{"error": {"code", "message", "details"}}`.
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
