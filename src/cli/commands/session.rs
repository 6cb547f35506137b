use crate::session::cookie::DEFAULT_MAX_AGE_SECONDS;
use clap::{builder::BoolishValueParser, Arg, ArgAction, ArgMatches, Command};

pub const ARG_COOKIE_SECURE: &str = "cookie-secure";
pub const ARG_COOKIE_MAX_AGE_SECONDS: &str = "cookie-max-age-seconds";

#[derive(Debug)]
pub struct Options {
    pub secure: bool,
    pub max_age_seconds: i64,
}

impl Options {
    /// Parse session cookie arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the max age is not positive.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let max_age_seconds = matches
            .get_one::<i64>(ARG_COOKIE_MAX_AGE_SECONDS)
            .copied()
            .unwrap_or(DEFAULT_MAX_AGE_SECONDS);
        if max_age_seconds <= 0 {
            anyhow::bail!("--{ARG_COOKIE_MAX_AGE_SECONDS} must be greater than zero");
        }

        Ok(Self {
            secure: matches.get_flag(ARG_COOKIE_SECURE),
            max_age_seconds,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_COOKIE_SECURE)
                .long(ARG_COOKIE_SECURE)
                .help("Mark session cookies Secure (enable when served over HTTPS)")
                .env("REALTY_EDGE_COOKIE_SECURE")
                .action(ArgAction::SetTrue)
                .value_parser(BoolishValueParser::new()),
        )
        .arg(
            Arg::new(ARG_COOKIE_MAX_AGE_SECONDS)
                .long(ARG_COOKIE_MAX_AGE_SECONDS)
                .help("Lifetime of every session cookie write in seconds")
                .env("REALTY_EDGE_COOKIE_MAX_AGE_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> Command {
        with_args(Command::new("test"))
    }

    #[test]
    fn defaults() {
        temp_env::with_vars(
            [
                ("REALTY_EDGE_COOKIE_SECURE", None::<&str>),
                ("REALTY_EDGE_COOKIE_MAX_AGE_SECONDS", None),
            ],
            || {
                let matches = command().get_matches_from(vec!["test"]);
                let options = Options::parse(&matches).unwrap();
                assert!(!options.secure);
                assert_eq!(options.max_age_seconds, DEFAULT_MAX_AGE_SECONDS);
            },
        );
    }

    #[test]
    fn secure_from_flag_or_env() {
        let matches = command().get_matches_from(vec!["test", "--cookie-secure"]);
        assert!(Options::parse(&matches).unwrap().secure);

        temp_env::with_var("REALTY_EDGE_COOKIE_SECURE", Some("yes"), || {
            let matches = command().get_matches_from(vec!["test"]);
            assert!(Options::parse(&matches).unwrap().secure);
        });
    }

    #[test]
    fn rejects_non_positive_max_age() {
        let matches =
            command().get_matches_from(vec!["test", "--cookie-max-age-seconds", "0"]);
        assert!(Options::parse(&matches).is_err());
    }
}
