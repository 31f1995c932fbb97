//! HTTP API server for the order fulfillment engine.
//!
//! Exposes the user, product, category and order surfaces over REST, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, patch, post, put};
use cache::ReadCache;
use fulfillment::{FlakyGateway, OrderService, PaymentExecutor, PaymentGateway, RetryPolicy};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{MemoryStore, Store};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, G>(state: Arc<AppState<S, G>>, metrics_handle: PrometheusHandle) -> Router
where
    S: Store + Clone + 'static,
    G: PaymentGateway + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/users", post(routes::users::create::<S, G>))
        .route("/users/{id}", get(routes::users::get::<S, G>))
        .route("/products", post(routes::products::create::<S, G>))
        .route("/products", get(routes::products::list::<S, G>))
        .route("/products/search", get(routes::products::search::<S, G>))
        .route("/products/{id}", get(routes::products::get::<S, G>))
        .route("/products/{id}", put(routes::products::update::<S, G>))
        .route("/products/{id}", delete(routes::products::delete::<S, G>))
        .route("/categories", post(routes::categories::create::<S, G>))
        .route("/categories", get(routes::categories::list::<S, G>))
        .route("/categories/{id}", get(routes::categories::get::<S, G>))
        .route(
            "/categories/{id}/tree",
            get(routes::categories::tree::<S, G>),
        )
        .route("/orders", post(routes::orders::create::<S, G>))
        .route("/orders/{id}", get(routes::orders::get::<S, G>))
        .route("/orders/{id}/pay", post(routes::orders::pay::<S, G>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S, G>))
        .route(
            "/orders/{id}/status",
            patch(routes::orders::set_status::<S, G>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the default application state: in-memory store, simulated payment
/// gateway, and the read cache, all parameterized by `config`.
pub fn create_default_state(config: &Config) -> Arc<AppState<MemoryStore, FlakyGateway>> {
    let store = MemoryStore::new();
    let gateway = FlakyGateway::new(
        config.payment_failure_rate,
        std::time::Duration::from_millis(100),
    );
    let policy = RetryPolicy::new(config.payment_max_attempts, config.payment_base_delay);

    Arc::new(AppState {
        orders: OrderService::new(store.clone()),
        payments: PaymentExecutor::new(store.clone(), gateway, policy),
        cache: ReadCache::new(config.cache_ttl),
        store,
    })
}
