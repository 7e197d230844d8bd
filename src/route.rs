//! Route definitions for the URL shortener API
//!
//! This module wires the handlers to their paths, guards the `/url` routes
//! with basic auth and installs the shared middleware stack.

use std::{any::Any, sync::Arc, time::Duration};

use axum::{
    body::Body,
    extract::FromRef,
    http::{Request, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::{info_span, Level};

use crate::config::HttpServer;
use crate::database::UrlStore;
use crate::error::ApiError;
use crate::handler::{self, DeleteHandler, RedirectHandler, SaveHandler};
use crate::middleware::basic_auth;

/// Handlers shared by the router; each route extracts the one it needs
#[derive(Clone)]
pub struct AppState {
    pub save: SaveHandler,
    pub redirect: RedirectHandler,
    pub delete: DeleteHandler,
}

impl FromRef<AppState> for SaveHandler {
    fn from_ref(state: &AppState) -> Self {
        state.save.clone()
    }
}

impl FromRef<AppState> for RedirectHandler {
    fn from_ref(state: &AppState) -> Self {
        state.redirect.clone()
    }
}

impl FromRef<AppState> for DeleteHandler {
    fn from_ref(state: &AppState) -> Self {
        state.delete.clone()
    }
}

/// Creates the application router
///
/// # Route Definitions
///
/// - `GET /{alias}` - Redirects to the target URL (public)
/// - `POST /url` - Saves a URL (basic auth)
/// - `DELETE /url/{alias}` - Deletes an alias (basic auth)
/// - `DELETE /url` - Deletes the alias named in the body (basic auth)
///
/// # Example Usage
///
/// ```no_run
/// # use std::sync::Arc;
/// # use url_shortener::config::Config;
/// # use url_shortener::database::UrlStore;
/// # use url_shortener::route::create_app;
/// # let config = Config::from_env().unwrap();
/// let store = Arc::new(UrlStore::open(&config.storage_path).unwrap());
/// let app = create_app(store, &config.http_server);
/// // server::serve(listener, app, (&config.http_server).into(), shutdown).await;
/// ```
pub fn create_app(store: Arc<UrlStore>, http: &HttpServer) -> Router {
    let state = AppState {
        save: SaveHandler::new(store.clone(), info_span!("handlers.url.save")),
        redirect: RedirectHandler::new(store.clone(), info_span!("handlers.url.redirect")),
        delete: DeleteHandler::new(store, info_span!("handlers.url.delete")),
    };

    let url_routes = Router::new()
        .route(
            "/url",
            post(handler::save).delete(handler::delete_by_body),
        )
        .route("/url/", delete(handler::delete_by_body))
        .route("/url/{alias}", delete(handler::delete))
        .route_layer(middleware::from_fn_with_state(
            http.credentials.clone(),
            basic_auth,
        ));

    let router = Router::new()
        .route("/{alias}", get(handler::redirect))
        .merge(url_routes)
        .with_state(state);

    with_middleware(router, http.timeout)
}

/// Wraps `router` in the shared middleware stack
///
/// Innermost first: request timeout (408), panic recovery (500 envelope),
/// request id propagation, request tracing and request id generation.
pub fn with_middleware(router: Router, timeout: Duration) -> Router {
    router
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(CatchPanicLayer::custom(|_: Box<dyn Any + Send + 'static>| {
            ApiError::Internal("internal error").into_response()
        }))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");
                    info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id
                    )
                })
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
