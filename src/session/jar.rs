//! Request-scoped cookie jar implementing [`SessionStore`].
//!
//! The jar starts from the request's `Cookie` headers. Writes update what later
//! reads see during the same request and queue `Set-Cookie` headers, which the
//! handler copies onto its response with [`CookieJarStore::apply`].

use super::{
    cookie::{expire_cookie, parse_cookie_headers, set_cookie, CookieOptions},
    Session, SessionStore, EMAIL_COOKIE, NAME_COOKIE, ROLE_COOKIE, TOKEN_COOKIE,
};
use axum::http::{header::SET_COOKIE, HeaderMap, HeaderValue};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};
use tracing::warn;

#[derive(Debug, Default)]
struct JarState {
    values: HashMap<String, String>,
    // One pending header per cookie name; the last write wins.
    pending: Vec<(String, String)>,
}

impl JarState {
    fn write(&mut self, name: &str, value: Option<&str>, options: CookieOptions) {
        let header = match value {
            Some(value) => {
                self.values.insert(name.to_string(), value.to_string());
                set_cookie(name, value, options)
            }
            None => {
                self.values.remove(name);
                expire_cookie(name, options)
            }
        };
        self.pending.retain(|(pending_name, _)| pending_name != name);
        self.pending.push((name.to_string(), header));
    }
}

#[derive(Clone, Debug)]
pub struct CookieJarStore {
    options: CookieOptions,
    state: Arc<Mutex<JarState>>,
}

impl CookieJarStore {
    /// Seeds the jar from the request's cookies.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, options: CookieOptions) -> Self {
        Self {
            options,
            state: Arc::new(Mutex::new(JarState {
                values: parse_cookie_headers(headers),
                pending: Vec::new(),
            })),
        }
    }

    /// `Set-Cookie` values queued by writes, in write order.
    #[must_use]
    pub fn pending_set_cookies(&self) -> Vec<String> {
        self.lock()
            .pending
            .iter()
            .map(|(_, header)| header.clone())
            .collect()
    }

    /// Appends the queued `Set-Cookie` headers to a response.
    pub fn apply(&self, headers: &mut HeaderMap) {
        for cookie in self.pending_set_cookies() {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    headers.append(SET_COOKIE, value);
                }
                Err(err) => warn!("Dropping invalid Set-Cookie header: {err}"),
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, JarState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for CookieJarStore {
    fn get(&self) -> Session {
        let state = self.lock();
        let read = |name: &str| state.values.get(name).cloned();
        Session::from_values(
            read(TOKEN_COOKIE),
            read(ROLE_COOKIE),
            read(NAME_COOKIE),
            read(EMAIL_COOKIE),
        )
    }

    fn set(&self, session: &Session) {
        let mut state = self.lock();
        state.write(TOKEN_COOKIE, session.token.as_deref(), self.options);
        state.write(
            ROLE_COOKIE,
            session.role.map(super::Role::as_str),
            self.options,
        );
        state.write(NAME_COOKIE, session.display_name.as_deref(), self.options);
        state.write(EMAIL_COOKIE, session.email.as_deref(), self.options);
    }

    fn clear(&self) {
        let mut state = self.lock();
        for name in super::SESSION_COOKIES {
            state.write(name, None, self.options);
        }
    }
}
