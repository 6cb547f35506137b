//! Forwards page requests that passed the route guard to the upstream app.

use super::EdgeState;
use crate::APP_USER_AGENT;
use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use std::{error::Error as StdError, time::Duration};
use tracing::error;
use url::Url;

/// Upper bound on a buffered request body.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

#[derive(Clone, Debug)]
pub struct Upstream {
    client: reqwest::Client,
    base_url: Url,
}

impl Upstream {
    /// # Errors
    /// Returns an error if the URL does not parse or the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid upstream URL: {base_url}"))?;

        // Redirects from upstream are handed back to the browser untouched.
        let mut builder = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .redirect(reqwest::redirect::Policy::none());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .context("Failed to build upstream HTTP client")?;

        Ok(Self { client, base_url })
    }

    /// Upstream URL for a request path plus optional query.
    #[must_use]
    pub fn url_for(&self, path_and_query: &str) -> String {
        format!(
            "{}{}",
            self.base_url.as_str().trim_end_matches('/'),
            path_and_query
        )
    }
}

/// `413` when the body went over [`MAX_BODY_BYTES`], `400` when the client
/// stream failed for any other reason.
fn body_error(err: &axum::Error) -> Response {
    if exceeded_body_limit(err) {
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("Request body exceeds {MAX_BODY_BYTES} bytes"),
        )
            .into_response();
    }
    (
        StatusCode::BAD_REQUEST,
        format!("Failed to read request body: {err}"),
    )
        .into_response()
}

fn exceeded_body_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(current) = source {
        if current.is::<LengthLimitError>() {
            return true;
        }
        source = current.source();
    }
    false
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in &HOP_BY_HOP {
        headers.remove(name);
    }
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);
}

/// Fallback handler: replays the request against the upstream and streams the
/// answer back.
pub async fn forward(State(state): State<EdgeState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path(), |pq| pq.as_str());
    let url = state.upstream.url_for(path_and_query);

    let body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => return body_error(&err),
    };

    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);

    let mut builder = state
        .upstream
        .client
        .request(parts.method, &url)
        .headers(headers);
    if !body.is_empty() {
        builder = builder.body(body);
    }

    let upstream = match builder.send().await {
        Ok(response) => response,
        Err(err) => {
            error!("Upstream request to {url} failed: {err}");
            return StatusCode::BAD_GATEWAY.into_response();
        }
    };

    let status = upstream.status();
    let mut response_headers = upstream.headers().clone();
    strip_hop_by_hop(&mut response_headers);

    match upstream.bytes().await {
        Ok(bytes) => {
            let mut response = Response::new(Body::from(bytes));
            *response.status_mut() = status;
            *response.headers_mut() = response_headers;
            response
        }
        Err(err) => {
            error!("Failed to read upstream response from {url}: {err}");
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_for_joins_without_double_slash() {
        let upstream = Upstream::new("http://127.0.0.1:3000/", None).unwrap();
        assert_eq!(
            upstream.url_for("/tenant/bookings?page=2"),
            "http://127.0.0.1:3000/tenant/bookings?page=2"
        );
    }

    #[test]
    fn rejects_invalid_url() {
        assert!(Upstream::new("not a url", None).is_err());
    }

    #[tokio::test]
    async fn oversized_body_is_payload_too_large() {
        let err = to_bytes(Body::from(vec![0_u8; 16]), 8).await.unwrap_err();
        assert!(exceeded_body_limit(&err));
        assert_eq!(body_error(&err).status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn broken_body_stream_is_bad_request() {
        let err = axum::Error::new(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "client went away",
        ));
        assert!(!exceeded_body_limit(&err));
        assert_eq!(body_error(&err).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn strips_connection_level_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, "keep-alive".parse().unwrap());
        headers.insert(header::HOST, "edge.local".parse().unwrap());
        headers.insert(header::TRANSFER_ENCODING, "chunked".parse().unwrap());
        headers.insert(header::COOKIE, "auth_token=abc".parse().unwrap());
        strip_hop_by_hop(&mut headers);
        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key(header::COOKIE));
    }
}
