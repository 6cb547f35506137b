//! # realty-edge
//!
//! Session and routing gate for the real-estate dashboard. It sits in front of
//! the dashboard app and the remote auth API.
//!
//! ## Sessions
//!
//! A session is four cookies: `auth_token`, `user_role`, `user_name` and
//! `user_email`. Code reads and writes them only through
//! [`session::SessionStore`]. In the server every request gets its own
//! [`session::CookieJarStore`]; tests use [`session::MemoryStore`].
//!
//! ## Auth flows
//!
//! [`gateway::AuthGateway`] wraps register, login, OTP verification, OTP
//! resend, logout and profile fetch against the remote API. Login and a
//! token-bearing OTP verification persist the session; logout always clears
//! it. [`auth_state::AuthState`] publishes `{authenticated, user, loading}`
//! snapshots over a `tokio::sync::watch` channel.
//!
//! ## Route guard
//!
//! `/admin`, `/landlord`, `/tenant` and `/agent` belong to one role each.
//! [`guard::decide`] sends visitors without a token to
//! `/login?next=<path>` and visitors with the wrong role to their own home.
//! The role cookie is client-writable; the remote API remains the authority.

pub mod api;
pub mod auth_state;
pub mod cli;
pub mod gateway;
pub mod guard;
pub mod session;

#[cfg(test)]
mod testing;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
