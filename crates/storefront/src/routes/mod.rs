//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Bundled storefront and admin page
//! GET  /health                 - Health check
//! GET  /uploads/{file}         - Uploaded product images
//!
//! # Catalog
//! GET  /api/products           - Full catalog
//! POST /api/products           - Replace the catalog (admin edit/delete)
//! POST /api/add-product        - Add one product with optional image (multipart)
//!
//! # Orders
//! GET  /api/orders             - Full order log (admin)
//! POST /api/order              - Place an order
//! ```

pub mod orders;
pub mod products;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::middleware::request_id_middleware;
use crate::services::UPLOADS_ROUTE;
use crate::state::AppState;

/// Largest accepted add-product request (image included).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index).post(products::replace))
        .route(
            "/add-product",
            post(products::add).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/orders", get(orders::index))
        .route("/order", post(orders::place))
}

/// Create the complete application: API, uploads, static page and the
/// request middleware stack.
pub fn app(state: AppState) -> Router {
    let uploads = ServeDir::new(state.uploads().dir());
    let static_page = ServeDir::new(&state.config().static_dir);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes())
        .nest_service(UPLOADS_ROUTE, uploads)
        .fallback_service(static_page)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the data directory.
async fn health() -> &'static str {
    "ok"
}
