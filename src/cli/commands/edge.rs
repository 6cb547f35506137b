use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use url::Url;

pub const ARG_PORT: &str = "port";
pub const ARG_API_URL: &str = "api-url";
pub const ARG_UPSTREAM_URL: &str = "upstream-url";
pub const ARG_REQUEST_TIMEOUT_SECONDS: &str = "request-timeout-seconds";

#[derive(Debug)]
pub struct Options {
    pub port: u16,
    pub api_url: String,
    pub upstream_url: String,
    pub request_timeout_seconds: Option<u64>,
}

impl Options {
    /// Parse listener and remote endpoint arguments from matches.
    ///
    /// # Errors
    /// Returns an error if a URL is missing or not an absolute http(s) URL.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        Ok(Self {
            port: matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080),
            api_url: required_url(matches, ARG_API_URL)?,
            upstream_url: required_url(matches, ARG_UPSTREAM_URL)?,
            request_timeout_seconds: matches
                .get_one::<u64>(ARG_REQUEST_TIMEOUT_SECONDS)
                .copied()
                .filter(|seconds| *seconds > 0),
        })
    }
}

fn required_url(matches: &ArgMatches, id: &str) -> Result<String> {
    let value = matches
        .get_one::<String>(id)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .with_context(|| format!("missing required argument: --{id}"))?;

    let url = Url::parse(&value).with_context(|| format!("invalid --{id}: {value}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("invalid --{id}: {value} (expected http or https)");
    }

    Ok(value)
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("REALTY_EDGE_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("Base URL of the remote auth API, example: https://api.realty.tld")
                .env("REALTY_EDGE_API_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_UPSTREAM_URL)
                .long(ARG_UPSTREAM_URL)
                .help("Base URL of the dashboard app that allowed page requests are proxied to")
                .env("REALTY_EDGE_UPSTREAM_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_REQUEST_TIMEOUT_SECONDS)
                .long(ARG_REQUEST_TIMEOUT_SECONDS)
                .help("Timeout for auth API and upstream requests (default: none)")
                .env("REALTY_EDGE_REQUEST_TIMEOUT_SECONDS")
                .value_parser(clap::value_parser!(u64)),
        )
}
