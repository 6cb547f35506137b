//! Cookie-backed session persistence for the dashboard.
//!
//! A session is four independent cookies: the bearer token, the user's role,
//! and display caches for name and email. Everything that reads or writes them
//! goes through the [`SessionStore`] trait so the route guard, the auth gateway
//! and the auth state never touch a cookie jar directly.
//!
//! Security boundaries: nothing here signs or encrypts values. The role cookie
//! is client-writable, so role checks built on it are routing hints only; the
//! remote API must authorize every call with the bearer token.

pub mod cookie;
mod jar;
mod memory;

pub use cookie::CookieOptions;
pub use jar::CookieJarStore;
pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

/// Bearer credential; presence means authenticated.
pub const TOKEN_COOKIE: &str = "auth_token";
/// One of `ADMIN`, `LANDLORD`, `TENANT`, `AGENT`.
pub const ROLE_COOKIE: &str = "user_role";
/// Display name cache.
pub const NAME_COOKIE: &str = "user_name";
/// Display email cache.
pub const EMAIL_COOKIE: &str = "user_email";

/// Every cookie the session owns, in write order.
pub const SESSION_COOKIES: [&str; 4] = [TOKEN_COOKIE, ROLE_COOKIE, NAME_COOKIE, EMAIL_COOKIE];

/// Dashboard roles. Wire values are upper-case.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Landlord,
    Tenant,
    Agent,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Landlord, Role::Tenant, Role::Agent];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Landlord => "LANDLORD",
            Self::Tenant => "TENANT",
            Self::Agent => "AGENT",
        }
    }

    /// Dashboard root for this role, also the guard's redirect target.
    #[must_use]
    pub const fn home_path(self) -> &'static str {
        match self {
            Self::Admin => "/admin",
            Self::Landlord => "/landlord",
            Self::Tenant => "/tenant",
            Self::Agent => "/agent",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| UnknownRole(value.to_string()))
    }
}

/// Snapshot of the four session cookies. Absent or empty cookies are `None`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub role: Option<Role>,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl Session {
    /// Token presence is the only local notion of "logged in".
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Builds a session from raw cookie values. Unrecognized roles are dropped.
    #[must_use]
    pub fn from_values(
        token: Option<String>,
        role: Option<String>,
        display_name: Option<String>,
        email: Option<String>,
    ) -> Self {
        Self {
            token: non_empty(token),
            role: non_empty(role).and_then(|value| value.parse().ok()),
            display_name: non_empty(display_name),
            email: non_empty(email),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("role", &self.role)
            .field("display_name", &self.display_name)
            .field("email", &self.email)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Session repository shared by the guard, the gateway and the auth state.
///
/// Writes are sequential and never roll back; a store that fails halfway may
/// leave a mix of old and new cookies.
pub trait SessionStore: Send + Sync {
    /// Reads all four fields independently.
    fn get(&self) -> Session;

    /// Overwrites all four fields. `None` fields are expired.
    fn set(&self, session: &Session);

    /// Expires all four fields immediately.
    fn clear(&self);

    fn is_authenticated(&self) -> bool {
        self.get().is_authenticated()
    }
}
