//! HTTP helpers for the remote JSON API. Every auth call goes through here so
//! URL building, bearer headers and error mapping stay in one place. The
//! helpers never log request bodies or bearer tokens.

use super::error::ApiError;
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Maximum number of characters of a non-JSON error body kept in messages.
const MAX_ERROR_CHARS: usize = 200;

/// Shared client for the remote API. Cheap to clone; clones share the
/// connection pool.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Builds a client for `base_url`. Without a timeout, requests run until
    /// the transport gives up.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the base URL is empty or the HTTP client
    /// cannot be built.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ApiError::Config("API base URL is not configured.".to_string()));
        }

        let mut builder = Client::builder().user_agent(crate::APP_USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|err| ApiError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }

    /// GETs JSON, optionally with a bearer credential.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        bearer: Option<&str>,
    ) -> Result<T, ApiError> {
        let request = with_bearer(self.http.get(self.url(path)), bearer);
        let response = send(request).await?;
        handle_json_response(response).await
    }

    /// POSTs a JSON body and decodes a JSON response.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<T, ApiError> {
        let request = with_bearer(self.http.post(self.url(path)).json(body), bearer);
        let response = send(request).await?;
        handle_json_response(response).await
    }

    /// POSTs without a body and ignores whatever the server returns on success.
    pub async fn post_empty(&self, path: &str, bearer: Option<&str>) -> Result<(), ApiError> {
        let request = with_bearer(self.http.post(self.url(path)), bearer);
        let response = send(request).await?;
        handle_empty_response(response).await
    }

    fn url(&self, path: &str) -> String {
        build_url(&self.base_url, path)
    }
}

/// Joins a base URL and a path with exactly one slash between them.
fn build_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim().trim_start_matches('/');
    format!("{base}/{path}")
}

fn with_bearer(request: RequestBuilder, bearer: Option<&str>) -> RequestBuilder {
    match bearer {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
    request.send().await.map_err(map_request_error)
}

/// Maps transport failures; none of these carry an HTTP status.
fn map_request_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout("Request timed out. Please try again.".to_string())
    } else if err.is_builder() {
        ApiError::Serialization(format!("Failed to build request: {err}"))
    } else {
        ApiError::Network(format!("Unable to reach the server: {err}"))
    }
}

async fn handle_json_response<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    if response.status().is_success() {
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ApiError::Network(format!("Failed to read response: {err}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::Parse(format!("Failed to decode response: {err}")))
    } else {
        Err(http_error(response).await)
    }
}

async fn handle_empty_response(response: Response) -> Result<(), ApiError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(http_error(response).await)
    }
}

async fn http_error(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let body = parse_error_body(&text);
    let message = error_message(status, &body);
    debug!(status, "Remote API rejected request");
    ApiError::Http {
        status,
        message,
        body,
    }
}

/// Keeps JSON bodies as-is; anything else becomes a trimmed string.
fn parse_error_body(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed)
        .unwrap_or_else(|_| Value::String(trimmed.chars().take(MAX_ERROR_CHARS).collect()))
}

/// Picks a human-readable message out of an error payload.
///
/// Looks at `detail` first (a string, or a list of `{msg}` validation entries),
/// then `message`, then falls back to a generic status message.
pub(crate) fn error_message(status: u16, body: &Value) -> String {
    let from_detail = match body.get("detail") {
        Some(Value::String(detail)) => Some(detail.clone()),
        Some(Value::Array(entries)) => entries
            .iter()
            .find_map(|entry| entry.get("msg").and_then(Value::as_str))
            .map(ToString::to_string),
        _ => None,
    };

    from_detail
        .or_else(|| {
            body.get("message")
                .and_then(Value::as_str)
                .map(ToString::to_string)
        })
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("Request failed with status {status}"))
}
