//! Wire types for the remote auth endpoints.

use crate::session::{Role, Session};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
    pub password_hash: &'a str,
}

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct VerifyOtpRequest<'a> {
    pub email: &'a str,
    pub otp: &'a str,
}

#[derive(Serialize)]
pub(crate) struct EmailRequest<'a> {
    pub email: &'a str,
}

/// Server-side profile. Only `role`, `full_name` and `email` are interpreted;
/// every other field is kept verbatim in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuthUser {
    /// Parsed role, `None` when missing or unrecognized.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.role.as_deref().and_then(|role| role.parse().ok())
    }

    /// Session that a successful login with this user and token persists.
    #[must_use]
    pub fn to_session(&self, token: &str) -> Session {
        Session::from_values(
            Some(token.to_string()),
            self.role.clone(),
            self.full_name.clone(),
            self.email.clone(),
        )
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(alias = "token")]
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: AuthUser,
}

#[derive(Clone, Debug, Deserialize)]
pub struct VerifyOtpResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default, alias = "token")]
    pub access_token: Option<String>,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}
