//! Maps validated CLI arguments to an action.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{edge, session};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let edge_opts = edge::Options::parse(matches)?;
    let session_opts = session::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port: edge_opts.port,
        api_url: edge_opts.api_url,
        upstream_url: edge_opts.upstream_url,
        request_timeout_seconds: edge_opts.request_timeout_seconds,
        cookie_secure: session_opts.secure,
        cookie_max_age_seconds: session_opts.max_age_seconds,
    }))
}
