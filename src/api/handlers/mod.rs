pub mod health;
pub mod session;

use crate::{gateway::ApiError, session::CookieJarStore};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{error, warn};
use utoipa::ToSchema;

/// Error payload, shaped like the remote API's own errors.
#[derive(ToSchema, Serialize, Debug)]
pub struct ErrorBody {
    pub detail: String,
}

/// Maps gateway failures to edge responses. Remote rejections keep their
/// status and message; transport failures become 502/504.
pub(crate) fn gateway_error(err: &ApiError) -> Response {
    let (status, detail) = match err {
        ApiError::Http {
            status, message, ..
        } => (
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
            message.clone(),
        ),
        ApiError::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
        ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, err.to_string()),
        ApiError::Timeout(_) => {
            warn!("Auth API timed out: {err}");
            (
                StatusCode::GATEWAY_TIMEOUT,
                "The authentication service timed out.".to_string(),
            )
        }
        ApiError::Network(_) => {
            warn!("Auth API unreachable: {err}");
            (
                StatusCode::BAD_GATEWAY,
                "The authentication service is unavailable.".to_string(),
            )
        }
        ApiError::Parse(_) | ApiError::Serialization(_) | ApiError::Config(_) => {
            error!("Auth API call failed: {err}");
            (
                StatusCode::BAD_GATEWAY,
                "Unexpected response from the authentication service.".to_string(),
            )
        }
    };

    (status, Json(ErrorBody { detail })).into_response()
}

/// Copies the jar's pending `Set-Cookie` headers onto a response.
pub(crate) fn with_cookies(jar: &CookieJarStore, response: impl IntoResponse) -> Response {
    let mut response = response.into_response();
    jar.apply(response.headers_mut());
    response
}
