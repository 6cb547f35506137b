use crate::{
    api::{self, EdgeState, Upstream},
    gateway::ApiClient,
    guard::GuardConfig,
    session::CookieOptions,
};
use anyhow::{Context, Result};
use std::{sync::Arc, time::Duration};
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub api_url: String,
    pub upstream_url: String,
    pub request_timeout_seconds: Option<u64>,
    pub cookie_secure: bool,
    pub cookie_max_age_seconds: i64,
}

impl Args {
    fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_seconds.map(Duration::from_secs)
    }

    fn cookie_options(&self) -> CookieOptions {
        CookieOptions::default()
            .with_secure(self.cookie_secure)
            .with_max_age_seconds(self.cookie_max_age_seconds)
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if a client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let timeout = args.request_timeout();
    let cookie_options = args.cookie_options();

    let api = ApiClient::new(&args.api_url, timeout).context("Failed to build auth API client")?;
    let upstream = Upstream::new(&args.upstream_url, timeout)?;

    debug!(
        api_url = %args.api_url,
        upstream_url = %args.upstream_url,
        secure_cookies = cookie_options.secure,
        "Edge configuration"
    );

    let guard = Arc::new(GuardConfig::default().with_cookie_options(cookie_options));
    let state = EdgeState::new(api, cookie_options, upstream);

    api::new(args.port, state, guard).await
}
