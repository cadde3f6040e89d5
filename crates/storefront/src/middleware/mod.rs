//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, added in `main`)
//! 2. `CorsLayer` (any origin)
//! 3. `TraceLayer` (request span)
//! 4. Request ID (record in span, Sentry scope and response)

pub mod request_id;

pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
