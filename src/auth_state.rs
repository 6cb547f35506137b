//! Observable auth state derived from the session store and a profile fetch.
//!
//! Token presence alone decides `authenticated`. A failed profile fetch
//! (expired token, unreachable API) leaves the session authenticated with no
//! user so a transient failure never bounces the caller to "logged out"; the
//! remote API stays the judge of token validity.
//!
//! Concurrent `refresh` calls are neither cancelled nor coalesced. Each one
//! overwrites the snapshot when it completes, so the last completion wins.

use crate::gateway::{AuthGateway, AuthUser};
use tokio::sync::watch;
use tracing::debug;

/// What the UI sees.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthSnapshot {
    pub authenticated: bool,
    pub user: Option<AuthUser>,
    pub loading: bool,
}

impl AuthSnapshot {
    /// State before the first resolution completes.
    #[must_use]
    pub const fn pending() -> Self {
        Self {
            authenticated: false,
            user: None,
            loading: true,
        }
    }

    #[must_use]
    pub const fn signed_out() -> Self {
        Self {
            authenticated: false,
            user: None,
            loading: false,
        }
    }
}

impl Default for AuthSnapshot {
    fn default() -> Self {
        Self::pending()
    }
}

#[derive(Debug)]
pub struct AuthState {
    gateway: AuthGateway,
    tx: watch::Sender<AuthSnapshot>,
}

impl AuthState {
    /// Creates the state in its loading phase; call [`AuthState::refresh`] to
    /// resolve it.
    #[must_use]
    pub fn new(gateway: AuthGateway) -> Self {
        let (tx, _rx) = watch::channel(AuthSnapshot::pending());
        Self { gateway, tx }
    }

    /// Creates the state and runs the initial resolution.
    pub async fn resolve(gateway: AuthGateway) -> Self {
        let state = Self::new(gateway);
        state.refresh().await;
        state
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.tx.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().authenticated
    }

    /// Re-reads the session and, when a token is present, the profile.
    pub async fn refresh(&self) -> AuthSnapshot {
        if !self.gateway.store().is_authenticated() {
            return self.publish(AuthSnapshot::signed_out());
        }

        self.tx.send_modify(|snapshot| {
            snapshot.authenticated = true;
            snapshot.loading = true;
        });

        let user = match self.gateway.me().await {
            Ok(user) => Some(user),
            Err(err) => {
                debug!("Profile fetch failed, keeping session: {err}");
                None
            }
        };

        self.publish(AuthSnapshot {
            authenticated: true,
            user,
            loading: false,
        })
    }

    /// Logs out through the gateway (local clear guaranteed) and resets the
    /// snapshot.
    pub async fn logout(&self) {
        self.gateway.logout().await;
        self.publish(AuthSnapshot::signed_out());
    }

    fn publish(&self, snapshot: AuthSnapshot) -> AuthSnapshot {
        self.tx.send_replace(snapshot.clone());
        snapshot
    }
}
