//! Role-scoped route protection.
//!
//! [`decide`] is a pure function of the request path and the session read from
//! cookies; [`middleware::route_guard`] applies it to every page request.
//!
//! The role comes from a client-writable cookie, so this is a routing
//! convenience and not an authorization boundary. The remote API must check
//! the bearer token on every call.

pub mod middleware;
mod routes;

pub use middleware::{route_guard, GuardConfig};
pub use routes::{RouteRule, RouteTable, RouteTableError};

use crate::session::{Role, Session};

/// Where unauthenticated visitors are sent.
pub const LOGIN_PATH: &str = "/login";
/// Query parameter carrying the page to return to after login.
pub const NEXT_PARAM: &str = "next";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// No token; `next` is the original path.
    RedirectToLogin { next: String },
    /// Token present but the role does not fit the route. Carries the
    /// visitor's own role, `None` when absent or unrecognized.
    RedirectToRoleHome(Option<Role>),
}

impl Decision {
    /// Redirect target, `None` for [`Decision::Allow`].
    #[must_use]
    pub fn location(&self) -> Option<String> {
        match self {
            Self::Allow => None,
            Self::RedirectToLogin { next } => Some(login_location(next)),
            Self::RedirectToRoleHome(Some(role)) => Some(role.home_path().to_string()),
            Self::RedirectToRoleHome(None) => Some(LOGIN_PATH.to_string()),
        }
    }
}

/// `/login?next=<percent-encoded path>`
#[must_use]
pub fn login_location(next: &str) -> String {
    format!("{LOGIN_PATH}?{NEXT_PARAM}={}", urlencoding::encode(next))
}

/// Decides whether a navigation to `path` may proceed.
#[must_use]
pub fn decide(routes: &RouteTable, path: &str, session: &Session) -> Decision {
    let Some(rule) = routes.matching(path) else {
        return Decision::Allow;
    };

    if !session.is_authenticated() {
        return Decision::RedirectToLogin {
            next: path.to_string(),
        };
    }

    if session.role == Some(rule.role) {
        Decision::Allow
    } else {
        Decision::RedirectToRoleHome(session.role)
    }
}
