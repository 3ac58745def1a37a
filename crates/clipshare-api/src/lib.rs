//! # clipshare-api
//!
//! HTTP surface for shared clipboard collections.
//!
//! | Method | Path | |
//! |---|---|---|
//! | `POST` | `/collections` | create an empty collection |
//! | `GET` | `/collections/{id}` | read a collection |
//! | `POST` | `/collections/{id}/items` | prepend an item |
//! | `DELETE` | `/collections/{id}/items/{itemId}` | remove an item |
//! | `GET` | `/health` | store reachability |
//! | `GET` | `/openapi.json` | OpenAPI document |

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod state;
pub mod telemetry;

use axum::extract::DefaultBodyLimit;
use axum::http::Request;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub use config::ApiConfig;
pub use error::ApiError;
pub use state::AppState;

use middleware::{cors_layer, rate_limit_middleware, MakeRequestUuidV7};

/// Assemble routes and middleware.
///
/// Layers run outermost-last: the body limits and CORS see the request first,
/// then request-id assignment, tracing, and finally the rate limiter.
/// `max_body_bytes` bounds both the raw body and the `Json` extractor.
pub fn build_router(state: AppState, config: &ApiConfig) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(openapi::openapi_json))
        .route("/collections", post(handlers::create_collection))
        .route("/collections/:id", get(handlers::get_collection))
        .route("/collections/:id/items", post(handlers::add_item))
        .route(
            "/collections/:id/items/:item_id",
            delete(handlers::delete_item),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .extensions()
                    .get::<RequestId>()
                    .and_then(|id| id.header_value().to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors_layer(&config.allowed_origins))
        // Json's built-in 2 MiB cap would otherwise override larger limits
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .with_state(state)
}
