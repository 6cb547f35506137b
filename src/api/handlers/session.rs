//! Session endpoints. Each request gets its own cookie jar; whatever the
//! gateway writes to it leaves as `Set-Cookie` headers, which the route guard
//! reads on the next navigation.

use super::{gateway_error, with_cookies, ErrorBody};
use crate::{
    api::EdgeState,
    auth_state::AuthState,
    gateway::AuthUser,
    session::Role,
};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

#[derive(ToSchema, Deserialize)]
pub struct RegisterBody {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[schema(format = Password)]
    pub password: String,
}

#[derive(ToSchema, Deserialize)]
pub struct LoginBody {
    pub email: String,
    #[schema(format = Password)]
    pub password: String,
}

#[derive(ToSchema, Deserialize)]
pub struct VerifyOtpBody {
    pub email: String,
    pub otp: String,
}

#[derive(ToSchema, Deserialize)]
pub struct EmailBody {
    pub email: String,
}

/// The profile fields the dashboard reads. Remaining profile fields are
/// passed through untouched in `extra`.
#[derive(ToSchema, Serialize, Debug, Clone, PartialEq)]
pub struct UserView {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

impl From<&AuthUser> for UserView {
    fn from(user: &AuthUser) -> Self {
        Self {
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            role: user.role(),
            extra: user.extra.clone(),
        }
    }
}

#[derive(ToSchema, Serialize, Debug)]
pub struct RegisterView {
    pub message: String,
    pub user: Option<UserView>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct VerifyOtpView {
    pub message: String,
    pub authenticated: bool,
    pub user: Option<UserView>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct MessageView {
    pub message: String,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct SessionStateView {
    pub authenticated: bool,
    pub loading: bool,
    pub user: Option<UserView>,
}

#[utoipa::path(
    post,
    path = "/session/register",
    request_body = RegisterBody,
    responses(
        (status = 201, description = "Account created, OTP sent", body = RegisterView),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 502, description = "Auth API unavailable", body = ErrorBody)
    ),
    tag = "session"
)]
pub async fn register(State(state): State<EdgeState>, Json(body): Json<RegisterBody>) -> Response {
    let jar = state.jar(&HeaderMap::new());
    let password = SecretString::from(body.password);
    match state
        .gateway(&jar)
        .register(&body.full_name, &body.email, body.phone.as_deref(), &password)
        .await
    {
        Ok(response) => (
            StatusCode::CREATED,
            Json(RegisterView {
                message: response.message,
                user: response.user.as_ref().map(UserView::from),
            }),
        )
            .into_response(),
        Err(err) => gateway_error(&err),
    }
}

#[utoipa::path(
    post,
    path = "/session/login",
    request_body = LoginBody,
    responses(
        (status = 200, description = "Logged in; session cookies set", body = UserView),
        (status = 401, description = "Rejected by the auth API", body = ErrorBody),
        (status = 502, description = "Auth API unavailable", body = ErrorBody)
    ),
    tag = "session"
)]
pub async fn login(
    State(state): State<EdgeState>,
    headers: HeaderMap,
    Json(body): Json<LoginBody>,
) -> Response {
    let jar = state.jar(&headers);
    let password = SecretString::from(body.password);
    match state.gateway(&jar).login(&body.email, &password).await {
        Ok(response) => with_cookies(&jar, Json(UserView::from(&response.user))),
        Err(err) => gateway_error(&err),
    }
}

#[utoipa::path(
    post,
    path = "/session/verify-otp",
    request_body = VerifyOtpBody,
    responses(
        (status = 200, description = "Code accepted; cookies set when a token was issued", body = VerifyOtpView),
        (status = 400, description = "Incomplete code or rejected by the auth API", body = ErrorBody)
    ),
    tag = "session"
)]
pub async fn verify_otp(
    State(state): State<EdgeState>,
    headers: HeaderMap,
    Json(body): Json<VerifyOtpBody>,
) -> Response {
    let jar = state.jar(&headers);
    let gateway = state.gateway(&jar);
    match gateway.verify_otp(&body.email, &body.otp).await {
        Ok(response) => {
            let view = VerifyOtpView {
                message: response.message.clone(),
                authenticated: gateway.store().is_authenticated(),
                user: response.user.as_ref().map(UserView::from),
            };
            with_cookies(&jar, Json(view))
        }
        Err(err) => gateway_error(&err),
    }
}

#[utoipa::path(
    post,
    path = "/session/resend-otp",
    request_body = EmailBody,
    responses(
        (status = 200, description = "A new code was requested", body = MessageView),
        (status = 400, description = "Invalid email", body = ErrorBody)
    ),
    tag = "session"
)]
pub async fn resend_otp(State(state): State<EdgeState>, Json(body): Json<EmailBody>) -> Response {
    let jar = state.jar(&HeaderMap::new());
    match state.gateway(&jar).resend_otp(&body.email).await {
        Ok(response) => Json(MessageView {
            message: response.message,
        })
        .into_response(),
        Err(err) => gateway_error(&err),
    }
}

#[utoipa::path(
    post,
    path = "/session/logout",
    responses(
        (status = 204, description = "Session cookies expired")
    ),
    tag = "session"
)]
pub async fn logout(State(state): State<EdgeState>, headers: HeaderMap) -> Response {
    let jar = state.jar(&headers);
    // Remote failures are logged by the gateway; the cookies are cleared regardless.
    state.gateway(&jar).logout().await;
    with_cookies(&jar, StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/session/state",
    responses(
        (status = 200, description = "Resolved auth state for the caller's cookies", body = SessionStateView)
    ),
    tag = "session"
)]
pub async fn state(State(state): State<EdgeState>, headers: HeaderMap) -> Response {
    let jar = state.jar(&headers);
    let snapshot = AuthState::resolve(state.gateway(&jar)).await.snapshot();
    Json(SessionStateView {
        authenticated: snapshot.authenticated,
        loading: snapshot.loading,
        user: snapshot.user.as_ref().map(UserView::from),
    })
    .into_response()
}
