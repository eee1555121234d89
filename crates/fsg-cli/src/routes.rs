//! HTTP route definitions

use crate::{handlers, middleware, AppState};
use axum::{middleware as axum_middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main router
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        // Service endpoints
        .route("/", get(handlers::health_check).head(handlers::health_check))
        // Files: any path with a bucket and a file name
        .route(
            "/{*path}",
            get(handlers::get_file).head(handlers::head_file),
        );

    if state.config.rate_limit_rps > 0 {
        let rate_limiter = middleware::create_rate_limiter(state.config.rate_limit_rps);
        router = router.layer(axum_middleware::from_fn_with_state(
            rate_limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router = router
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware));

    if state.config.cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(Any);
        router = router.layer(cors);
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
