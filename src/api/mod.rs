use crate::{
    gateway::{ApiClient, AuthGateway},
    guard::{route_guard, GuardConfig},
    session::{CookieJarStore, CookieOptions},
};
use anyhow::Result;
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod handlers;
mod openapi;
pub mod proxy;

pub use openapi::ApiDoc;
pub use proxy::Upstream;

/// Shared by every handler. Sessions are never stored here; each request
/// builds its own [`CookieJarStore`].
#[derive(Clone, Debug)]
pub struct EdgeState {
    pub api: ApiClient,
    pub cookie_options: CookieOptions,
    pub upstream: Arc<Upstream>,
}

impl EdgeState {
    #[must_use]
    pub fn new(api: ApiClient, cookie_options: CookieOptions, upstream: Upstream) -> Self {
        Self {
            api,
            cookie_options,
            upstream: Arc::new(upstream),
        }
    }

    /// Session store over the request's `Cookie` headers.
    #[must_use]
    pub fn jar(&self, headers: &HeaderMap) -> CookieJarStore {
        CookieJarStore::from_headers(headers, self.cookie_options)
    }

    #[must_use]
    pub fn gateway(&self, jar: &CookieJarStore) -> AuthGateway {
        AuthGateway::new(self.api.clone(), Arc::new(jar.clone()))
    }
}

/// Session endpoints and docs are served directly; everything else runs
/// through the route guard and is proxied upstream.
pub fn router(state: EdgeState, guard: Arc<GuardConfig>) -> Router {
    let pages = Router::new()
        .fallback(proxy::forward)
        .layer(from_fn_with_state(guard, route_guard))
        .with_state(state.clone());

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/session/register", post(handlers::session::register))
        .route("/session/login", post(handlers::session::login))
        .route("/session/verify-otp", post(handlers::session::verify_otp))
        .route("/session/resend-otp", post(handlers::session::resend_otp))
        .route("/session/logout", post(handlers::session::logout))
        .route("/session/state", get(handlers::session::state))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback_service(pages)
        .with_state(state)
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, state: EdgeState, guard: Arc<GuardConfig>) -> Result<()> {
    let app = router(state, guard).layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span)),
    );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
