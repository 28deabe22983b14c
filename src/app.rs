// app.rs - router assembly
//
// Layer order, outermost first: panic catcher, trace, CORS, body limit,
// request logger, routing. Todo routes additionally run jwt_auth_middleware.

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{ConfigError, SecurityConfig};
use crate::error::ApiError;
use crate::handlers::{health, todos, token};
use crate::middleware::{jwt_auth_middleware, request_logging_middleware, RequestLogger};
use crate::state::AppState;

/// Build the full application router for the given state.
pub fn router(state: AppState) -> Result<Router, ConfigError> {
    let config = state.config.clone();

    let mut app = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/api/token/", post(token::obtain))
        .merge(todo_routes(state.clone()))
        .with_state(state);

    if config.api.enable_request_logging {
        let logger = Arc::new(RequestLogger::new(
            &config.logging,
            config.api.max_request_size_bytes,
        )?);
        app = app.layer(middleware::from_fn_with_state(logger, request_logging_middleware));
    }

    Ok(app
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(cors_layer(&config.security))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic)))
}

fn todo_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/todos/", get(todos::list).post(todos::create))
        .route(
            "/api/todos/:id/",
            get(todos::retrieve)
                .put(todos::update)
                .patch(todos::partial_update)
                .delete(todos::destroy),
        )
        .route("/api/todos/:id/mark_done/", patch(todos::mark_done))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AnyOrigin)
}

fn handle_panic(_panic: Box<dyn Any + Send + 'static>) -> Response {
    ApiError::internal_server_error("Internal server error").into_response()
}
