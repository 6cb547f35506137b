//! Client for the remote auth API. Successful login and OTP verification
//! overwrite the injected session store; logout always clears it, whatever the
//! server says.
//!
//! Flow Overview: register sends the account and the server mails an OTP.
//! `verify_otp` exchanges the code for a token (persisted when present) and
//! `resend_otp` asks for a fresh code. `login` persists the returned token and
//! profile. `me` reads the profile with the stored token as bearer.
//!
//! Input checks that need no server (email shape, OTP completeness) run before
//! any request and fail with `ApiError::Validation`.

mod api;
mod error;
mod types;

pub use api::ApiClient;
pub use error::ApiError;
pub use types::{
    AuthUser, LoginResponse, MessageResponse, RegisterResponse, VerifyOtpResponse,
};

use crate::session::SessionStore;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::{fmt, sync::Arc};
use tracing::{debug, instrument, warn};
use types::{EmailRequest, LoginRequest, RegisterRequest, VerifyOtpRequest};

pub const REGISTER_PATH: &str = "/auth/register";
pub const LOGIN_PATH: &str = "/auth/login";
pub const VERIFY_OTP_PATH: &str = "/auth/verify-otp";
pub const RESEND_OTP_PATH: &str = "/auth/resend-otp";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const ME_PATH: &str = "/auth/me";

/// Number of digits in a complete OTP entry.
pub const OTP_LENGTH: usize = 6;

/// Auth operations bound to one session store.
#[derive(Clone)]
pub struct AuthGateway {
    api: ApiClient,
    store: Arc<dyn SessionStore>,
}

impl fmt::Debug for AuthGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGateway")
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}

impl AuthGateway {
    #[must_use]
    pub fn new(api: ApiClient, store: Arc<dyn SessionStore>) -> Self {
        Self { api, store }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Creates an account. The session is untouched; the server follows up
    /// with an OTP.
    ///
    /// # Errors
    /// `Validation` for a bad email, empty name or empty password; otherwise
    /// whatever the remote call returns.
    #[instrument(skip_all)]
    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        phone: Option<&str>,
        password: &SecretString,
    ) -> Result<RegisterResponse, ApiError> {
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(ApiError::Validation("Full name is required.".to_string()));
        }
        let email = checked_email(email)?;
        if password.expose_secret().is_empty() {
            return Err(ApiError::Validation("Password is required.".to_string()));
        }
        let phone = phone.map(str::trim).filter(|p| !p.is_empty());

        let request = RegisterRequest {
            full_name,
            email: &email,
            phone,
            password_hash: password.expose_secret(),
        };
        self.api.post_json(REGISTER_PATH, &request, None).await
    }

    /// Logs in and overwrites the session with the returned token and profile.
    ///
    /// # Errors
    /// `Validation` for a bad email or empty password; otherwise whatever the
    /// remote call returns. The session is untouched on error.
    #[instrument(skip_all)]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<LoginResponse, ApiError> {
        let email = checked_email(email)?;
        if password.expose_secret().is_empty() {
            return Err(ApiError::Validation("Password is required.".to_string()));
        }

        let request = LoginRequest {
            email: &email,
            password: password.expose_secret(),
        };
        let response: LoginResponse = self.api.post_json(LOGIN_PATH, &request, None).await?;
        self.store
            .set(&response.user.to_session(&response.access_token));
        debug!(role = ?response.user.role(), "Session persisted after login");
        Ok(response)
    }

    /// Verifies an OTP. When the server returns a token, the session is
    /// overwritten with it.
    ///
    /// # Errors
    /// `Validation` for a bad email or an incomplete code, before any request.
    #[instrument(skip_all)]
    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<VerifyOtpResponse, ApiError> {
        let email = checked_email(email)?;
        let code = checked_otp(code)?;

        let request = VerifyOtpRequest {
            email: &email,
            otp: &code,
        };
        let response: VerifyOtpResponse =
            self.api.post_json(VERIFY_OTP_PATH, &request, None).await?;

        if let Some(token) = response.access_token.as_deref().filter(|t| !t.is_empty()) {
            let user = response.user.clone().unwrap_or_default();
            self.store.set(&user.to_session(token));
            debug!(role = ?user.role(), "Session persisted after OTP verification");
        }
        Ok(response)
    }

    /// Asks the server to send a fresh OTP.
    ///
    /// # Errors
    /// `Validation` for a bad email; otherwise whatever the remote call returns.
    #[instrument(skip_all)]
    pub async fn resend_otp(&self, email: &str) -> Result<MessageResponse, ApiError> {
        let email = checked_email(email)?;
        self.api
            .post_json(RESEND_OTP_PATH, &EmailRequest { email: &email }, None)
            .await
    }

    /// Tells the server to end the session, then clears the local session no
    /// matter how the remote call went.
    #[instrument(skip_all)]
    pub async fn logout(&self) {
        let token = self.store.get().token;
        if let Some(token) = token.as_deref() {
            if let Err(err) = self.api.post_empty(LOGOUT_PATH, Some(token)).await {
                warn!("Remote logout failed, clearing local session anyway: {err}");
            }
        }
        self.store.clear();
    }

    /// Fetches the current profile using the stored token.
    ///
    /// # Errors
    /// `Unauthenticated` when no token is stored; otherwise whatever the remote
    /// call returns.
    #[instrument(skip_all)]
    pub async fn me(&self) -> Result<AuthUser, ApiError> {
        let token = self.store.get().token.ok_or(ApiError::Unauthenticated)?;
        self.api.get_json(ME_PATH, Some(&token)).await
    }
}

/// Trims and checks the email shape.
fn checked_email(email: &str) -> Result<String, ApiError> {
    let email = email.trim();
    if valid_email(email) {
        Ok(email.to_string())
    } else {
        Err(ApiError::Validation(
            "Please enter a valid email address.".to_string(),
        ))
    }
}

pub(crate) fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}

/// An OTP entry is complete when it is exactly six ASCII digits.
fn checked_otp(code: &str) -> Result<String, ApiError> {
    let code = code.trim();
    if code.len() == OTP_LENGTH && code.chars().all(|c| c.is_ascii_digit()) {
        Ok(code.to_string())
    } else {
        Err(ApiError::Validation(format!(
            "Please enter the complete {OTP_LENGTH}-digit code."
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::{MemoryStore, Role, Session};
    use crate::testing::{spawn_api, unreachable_base_url};
    use axum::{
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn gateway(base_url: &str, store: &MemoryStore) -> AuthGateway {
        let api = ApiClient::new(base_url, None).unwrap();
        AuthGateway::new(api, Arc::new(store.clone()))
    }

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    fn signed_in() -> Session {
        Session {
            token: Some("t1".to_string()),
            role: Some(Role::Tenant),
            display_name: Some("A B".to_string()),
            email: Some("a@b.com".to_string()),
        }
    }

    #[tokio::test]
    async fn login_persists_session_from_response() {
        let router = Router::new().route(
            LOGIN_PATH,
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["email"], "a@b.com");
                assert_eq!(body["password"], "hunter22");
                Json(json!({
                    "access_token": "t1",
                    "token_type": "bearer",
                    "user": {"role": "TENANT", "full_name": "A B", "email": "a@b.com"}
                }))
            }),
        );
        let base = spawn_api(router).await;
        let store = MemoryStore::new();

        let response = gateway(&base, &store)
            .login(" a@b.com ", &secret("hunter22"))
            .await
            .unwrap();

        assert_eq!(response.access_token, "t1");
        assert_eq!(store.get(), signed_in());
    }

    #[tokio::test]
    async fn login_rejection_surfaces_detail_and_keeps_session() {
        let router = Router::new().route(
            LOGIN_PATH,
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"detail": "Invalid email or password"})),
                )
            }),
        );
        let base = spawn_api(router).await;
        let store = MemoryStore::with_session(signed_in());

        let err = gateway(&base, &store)
            .login("a@b.com", &secret("wrong"))
            .await
            .unwrap_err();

        match err {
            ApiError::Http {
                status,
                message,
                body,
            } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid email or password");
                assert_eq!(body, json!({"detail": "Invalid email or password"}));
            }
            other => panic!("expected HTTP error, got {other:?}"),
        }
        assert_eq!(store.get(), signed_in());
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        let store = MemoryStore::new();
        let err = gateway(&unreachable_base_url(), &store)
            .login("a@b.com", &secret("pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Network(_)), "got {err:?}");
        assert!(err.is_unreachable());
    }

    #[tokio::test]
    async fn verify_otp_persists_only_when_token_returned() {
        let router = Router::new().route(
            VERIFY_OTP_PATH,
            post(|Json(body): Json<Value>| async move {
                if body["otp"] == "123456" {
                    Json(json!({
                        "message": "Verified",
                        "access_token": "t1",
                        "user": {"role": "TENANT", "full_name": "A B", "email": "a@b.com"}
                    }))
                } else {
                    Json(json!({"message": "Verified, please log in"}))
                }
            }),
        );
        let base = spawn_api(router).await;

        let store = MemoryStore::new();
        let response = gateway(&base, &store)
            .verify_otp("a@b.com", "654321")
            .await
            .unwrap();
        assert_eq!(response.message, "Verified, please log in");
        assert!(!store.is_authenticated());

        let response = gateway(&base, &store)
            .verify_otp("a@b.com", " 123456 ")
            .await
            .unwrap();
        assert_eq!(response.message, "Verified");
        assert_eq!(store.get(), signed_in());
    }

    #[tokio::test]
    async fn incomplete_otp_never_reaches_the_server() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            VERIFY_OTP_PATH,
            post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Json(json!({"message": "ok"}))
                }
            }),
        );
        let base = spawn_api(router).await;
        let store = MemoryStore::new();
        let gateway = gateway(&base, &store);

        for code in ["", "123", "12345a", "1234567"] {
            let err = gateway.verify_otp("a@b.com", code).await.unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)), "code {code:?}");
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn register_sends_optional_phone_and_leaves_session() {
        let router = Router::new().route(
            REGISTER_PATH,
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["full_name"], "A B");
                assert_eq!(body["password_hash"], "s3cret");
                assert!(body.get("phone").is_none());
                (
                    StatusCode::CREATED,
                    Json(json!({"message": "OTP sent", "user": {"email": "a@b.com"}})),
                )
            }),
        );
        let base = spawn_api(router).await;
        let store = MemoryStore::new();

        let response = gateway(&base, &store)
            .register("A B", "a@b.com", Some("  "), &secret("s3cret"))
            .await
            .unwrap();
        assert_eq!(response.message, "OTP sent");
        assert_eq!(
            response.user.and_then(|u| u.email).as_deref(),
            Some("a@b.com")
        );
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn register_validates_before_sending() {
        let store = MemoryStore::new();
        let gateway = gateway(&unreachable_base_url(), &store);
        let err = gateway
            .register("", "a@b.com", None, &secret("pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        let err = gateway
            .register("A B", "not-an-email", None, &secret("pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn resend_otp_returns_message() {
        let router = Router::new().route(
            RESEND_OTP_PATH,
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["email"], "a@b.com");
                Json(json!({"message": "A new code is on its way"}))
            }),
        );
        let base = spawn_api(router).await;
        let store = MemoryStore::new();

        let response = gateway(&base, &store).resend_otp("a@b.com").await.unwrap();
        assert_eq!(response.message, "A new code is on its way");
    }

    #[tokio::test]
    async fn logout_clears_even_when_remote_fails() {
        let router = Router::new().route(
            LOGOUT_PATH,
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = spawn_api(router).await;
        let store = MemoryStore::with_session(signed_in());
        gateway(&base, &store).logout().await;
        assert_eq!(store.get(), Session::default());

        let store = MemoryStore::with_session(signed_in());
        gateway(&unreachable_base_url(), &store).logout().await;
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn me_sends_bearer_token() {
        let router = Router::new().route(
            ME_PATH,
            get(|headers: HeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                if auth == "Bearer t1" {
                    Json(json!({"full_name": "A B", "email": "a@b.com", "role": "TENANT", "id": 3}))
                        .into_response()
                } else {
                    (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Not authenticated"})))
                        .into_response()
                }
            }),
        );
        let base = spawn_api(router).await;
        let store = MemoryStore::with_session(signed_in());

        let user = gateway(&base, &store).me().await.unwrap();
        assert_eq!(user.role(), Some(Role::Tenant));
        assert_eq!(user.extra.get("id"), Some(&json!(3)));
    }

    #[tokio::test]
    async fn me_without_token_fails_fast() {
        let store = MemoryStore::new();
        let err = gateway(&unreachable_base_url(), &store).me().await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));
    }

    #[test]
    fn email_shape_check() {
        assert!(valid_email("a@b.com"));
        assert!(!valid_email("a@b"));
        assert!(!valid_email("a b@c.com"));
        assert!(!valid_email(""));
    }

}
