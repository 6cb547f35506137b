//! axum middleware running [`decide`](super::decide) before page requests.

use super::{decide, Decision, RouteTable};
use crate::session::{CookieJarStore, CookieOptions, SessionStore};
use axum::{
    extract::{Request, State},
    http::{uri::PathAndQuery, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Paths the guard never inspects: framework assets and the auth pages.
pub const DEFAULT_EXEMPT_PREFIXES: [&str; 10] = [
    "/_next",
    "/static",
    "/assets",
    "/images",
    "/favicon.ico",
    "/robots.txt",
    "/login",
    "/register",
    "/verify-otp",
    "/forgot-password",
];

#[derive(Clone, Debug)]
pub struct GuardConfig {
    pub routes: RouteTable,
    pub exempt_prefixes: Vec<String>,
    pub cookie_options: CookieOptions,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            routes: RouteTable::default(),
            exempt_prefixes: DEFAULT_EXEMPT_PREFIXES
                .iter()
                .map(ToString::to_string)
                .collect(),
            cookie_options: CookieOptions::default(),
        }
    }
}

impl GuardConfig {
    #[must_use]
    pub fn with_cookie_options(mut self, cookie_options: CookieOptions) -> Self {
        self.cookie_options = cookie_options;
        self
    }

    #[must_use]
    pub fn with_routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    #[must_use]
    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt_prefixes.iter().any(|prefix| {
            path.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}

/// Resolves `.` and `..` segments, plain or `%2e`-encoded, the same way the
/// upstream client's URL parser does.
fn resolve_dot_segments(path: &str) -> Option<String> {
    Url::parse(&format!("http://edge.invalid{path}"))
        .ok()
        .map(|url| url.path().to_string())
}

/// Returns `(forwarded, checked)`: the path sent upstream and the decoded
/// path the rules are matched against.
fn request_paths(raw: &str) -> Option<(String, String)> {
    let forwarded = resolve_dot_segments(raw)?;
    let decoded = urlencoding::decode(&forwarded).ok()?;
    let checked = resolve_dot_segments(&decoded)?;
    Some((forwarded, checked))
}

fn with_path(uri: &Uri, path: &str) -> Option<Uri> {
    let path_and_query = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query).ok()?);
    Uri::from_parts(parts).ok()
}

/// Redirects with `307 Temporary Redirect` or passes the request on.
///
/// Decisions are made on the resolved path, and a request whose path had dot
/// segments continues with the resolved URI so the proxy forwards exactly what
/// was checked.
pub async fn route_guard(
    State(config): State<Arc<GuardConfig>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some((forwarded, path)) = request_paths(request.uri().path()) else {
        return (StatusCode::BAD_REQUEST, "Invalid request path").into_response();
    };
    if forwarded != request.uri().path() {
        let Some(uri) = with_path(request.uri(), &forwarded) else {
            return (StatusCode::BAD_REQUEST, "Invalid request path").into_response();
        };
        *request.uri_mut() = uri;
    }

    if config.is_exempt(&path) {
        return next.run(request).await;
    }

    let session = CookieJarStore::from_headers(request.headers(), config.cookie_options).get();
    let decision = decide(&config.routes, &path, &session);

    match decision.location() {
        None => next.run(request).await,
        Some(location) => {
            debug!(
                path = %path,
                authenticated = session.is_authenticated(),
                redirect = %location,
                login = matches!(decision, Decision::RedirectToLogin { .. }),
                "Route guard redirect"
            );
            Redirect::temporary(&location).into_response()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{
        guard::{RouteRule, RouteTable},
        session::Role,
    };
    use axum::{
        body::Body,
        http::{self, header::COOKIE, header::LOCATION},
        middleware::from_fn_with_state,
        Router,
    };
    use tower::ServiceExt;

    fn app(config: GuardConfig) -> Router {
        Router::new()
            .fallback(|uri: Uri| async move { uri.to_string() })
            .layer(from_fn_with_state(Arc::new(config), route_guard))
    }

    async fn call_with(config: GuardConfig, path: &str, cookie: Option<&str>) -> Response {
        let mut builder = http::Request::builder().uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        app(config)
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn call(path: &str, cookie: Option<&str>) -> Response {
        call_with(GuardConfig::default(), path, cookie).await
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn location(response: &Response) -> Option<&str> {
        response.headers().get(LOCATION).and_then(|v| v.to_str().ok())
    }

    #[tokio::test]
    async fn anonymous_admin_request_redirects_to_login() {
        let response = call("/admin/properties", None).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            location(&response),
            Some("/login?next=%2Fadmin%2Fproperties")
        );
    }

    #[tokio::test]
    async fn wrong_role_redirects_home() {
        let response = call("/tenant", Some("auth_token=abc; user_role=LANDLORD")).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), Some("/landlord"));
    }

    #[tokio::test]
    async fn matching_role_passes_through() {
        let response = call("/tenant/bookings", Some("auth_token=abc; user_role=TENANT")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(location(&response), None);
    }

    #[tokio::test]
    async fn next_ignores_query_string() {
        let response = call("/agent/leads?page=2", None).await;
        assert_eq!(location(&response), Some("/login?next=%2Fagent%2Fleads"));
    }

    #[tokio::test]
    async fn exempt_paths_skip_the_guard() {
        for path in ["/login", "/_next/static/chunk.js", "/favicon.ico", "/register"] {
            let response = call(path, None).await;
            assert_eq!(response.status(), StatusCode::OK, "{path}");
        }
    }

    #[tokio::test]
    async fn dot_segments_cannot_reach_admin() {
        let response = call("/x/../admin", None).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), Some("/login?next=%2Fadmin"));
    }

    #[tokio::test]
    async fn encoded_dot_segments_are_resolved_before_matching() {
        let response = call(
            "/tenant/%2e%2e/admin",
            Some("auth_token=abc; user_role=TENANT"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), Some("/tenant"));
    }

    #[tokio::test]
    async fn percent_encoded_letters_are_decoded_before_matching() {
        let response = call("/%61dmin/users", None).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), Some("/login?next=%2Fadmin%2Fusers"));
    }

    #[tokio::test]
    async fn exempt_prefix_does_not_cover_dot_escapes() {
        let response = call("/login/../admin", None).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), Some("/login?next=%2Fadmin"));
    }

    #[tokio::test]
    async fn allowed_request_continues_with_resolved_uri() {
        let response = call(
            "/agent/x/../leads?page=2",
            Some("auth_token=abc; user_role=AGENT"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "/agent/leads?page=2");
    }

    #[tokio::test]
    async fn plain_request_uri_is_left_alone() {
        let response = call("/about?lang=es", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "/about?lang=es");
    }

    #[tokio::test]
    async fn custom_route_table_replaces_the_defaults() {
        let routes = RouteTable::new(vec![RouteRule::new("/reports", Role::Agent)]).unwrap();
        let config = GuardConfig::default().with_routes(routes);

        let response = call_with(config.clone(), "/reports/q3", None).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), Some("/login?next=%2Freports%2Fq3"));

        let response = call_with(
            config.clone(),
            "/reports",
            Some("auth_token=abc; user_role=TENANT"),
        )
        .await;
        assert_eq!(location(&response), Some("/tenant"));

        let response = call_with(config, "/admin", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn request_paths_resolve_and_decode() {
        assert_eq!(
            request_paths("/a/./b/../c"),
            Some(("/a/c".to_string(), "/a/c".to_string()))
        );
        assert_eq!(
            request_paths("/tenant/%2E%2E/admin"),
            Some(("/admin".to_string(), "/admin".to_string()))
        );
        assert_eq!(
            request_paths("/%61dmin"),
            Some(("/%61dmin".to_string(), "/admin".to_string()))
        );
        assert_eq!(
            request_paths("/tenant%2F..%2Fadmin"),
            Some(("/tenant%2F..%2Fadmin".to_string(), "/admin".to_string()))
        );
        assert_eq!(request_paths("/%ff"), None);
    }

    #[test]
    fn exemption_requires_segment_boundary() {
        let config = GuardConfig::default();
        assert!(config.is_exempt("/login"));
        assert!(config.is_exempt("/assets/logo.svg"));
        assert!(!config.is_exempt("/loginx"));
        assert!(!config.is_exempt("/admin"));
    }
}
