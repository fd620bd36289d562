use crate::credentials::HashCost;
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use std::time::Duration;

pub const ARG_SECRET: &str = "secret";
pub const ARG_TOKEN_TTL: &str = "token-ttl";
pub const ARG_HASH_MEMORY: &str = "hash-memory";
pub const ARG_HASH_ITERATIONS: &str = "hash-iterations";
pub const ARG_HASH_PARALLELISM: &str = "hash-parallelism";

// Argon2 defaults (argon2::Params::DEFAULT_*), as clap needs static strings.
const DEFAULT_HASH_MEMORY: &str = "19456";
const DEFAULT_HASH_ITERATIONS: &str = "2";
const DEFAULT_HASH_PARALLELISM: &str = "1";

pub struct Options {
    pub secret: SecretString,
    pub token_ttl: Duration,
    pub hash_cost: HashCost,
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("secret", &"***")
            .field("token_ttl", &self.token_ttl)
            .field("hash_cost", &self.hash_cost)
            .finish()
    }
}

impl Options {
    /// Parse token and hashing arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the signing secret is missing or blank.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let secret = match matches.get_one::<String>(ARG_SECRET) {
            Some(value) if !value.trim().is_empty() => SecretString::from(value.clone()),
            _ => anyhow::bail!("missing required argument: --{ARG_SECRET}"),
        };

        let token_ttl = matches
            .get_one::<u64>(ARG_TOKEN_TTL)
            .copied()
            .map_or(crate::auth::DEFAULT_TOKEN_TTL, Duration::from_secs);

        let defaults = HashCost::default();
        let get_u32 =
            |id: &str, default: u32| matches.get_one::<u32>(id).copied().unwrap_or(default);

        Ok(Self {
            secret,
            token_ttl,
            hash_cost: HashCost {
                memory_kib: get_u32(ARG_HASH_MEMORY, defaults.memory_kib),
                iterations: get_u32(ARG_HASH_ITERATIONS, defaults.iterations),
                parallelism: get_u32(ARG_HASH_PARALLELISM, defaults.parallelism),
            },
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SECRET)
                .long(ARG_SECRET)
                .help("Secret used to sign bearer tokens")
                .env("PORTIER_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_TOKEN_TTL)
                .long(ARG_TOKEN_TTL)
                .help("Bearer token lifetime in seconds")
                .env("PORTIER_TOKEN_TTL")
                .default_value("3600")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_HASH_MEMORY)
                .long(ARG_HASH_MEMORY)
                .help("Argon2 memory cost in KiB")
                .env("PORTIER_HASH_MEMORY")
                .default_value(DEFAULT_HASH_MEMORY)
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_HASH_ITERATIONS)
                .long(ARG_HASH_ITERATIONS)
                .help("Argon2 number of passes")
                .env("PORTIER_HASH_ITERATIONS")
                .default_value(DEFAULT_HASH_ITERATIONS)
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_HASH_PARALLELISM)
                .long(ARG_HASH_PARALLELISM)
                .help("Argon2 degree of parallelism")
                .env("PORTIER_HASH_PARALLELISM")
                .default_value(DEFAULT_HASH_PARALLELISM)
                .value_parser(clap::value_parser!(u32)),
        )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn command() -> Command {
        with_args(Command::new("portier"))
    }

    #[test]
    fn defaults() {
        temp_env::with_vars(
            [
                ("PORTIER_SECRET", Some("s3cret")),
                ("PORTIER_TOKEN_TTL", None),
                ("PORTIER_HASH_MEMORY", None),
                ("PORTIER_HASH_ITERATIONS", None),
                ("PORTIER_HASH_PARALLELISM", None),
            ],
            || {
                let matches = command().get_matches_from(vec!["portier"]);
                let options = Options::parse(&matches).unwrap();

                assert_eq!(options.secret.expose_secret(), "s3cret");
                assert_eq!(options.token_ttl, Duration::from_secs(3600));
                assert_eq!(options.hash_cost, HashCost::default());
            },
        );
    }

    #[test]
    fn default_cost_matches_argon2() {
        let defaults = HashCost::default();

        assert_eq!(DEFAULT_HASH_MEMORY, defaults.memory_kib.to_string());
        assert_eq!(DEFAULT_HASH_ITERATIONS, defaults.iterations.to_string());
        assert_eq!(DEFAULT_HASH_PARALLELISM, defaults.parallelism.to_string());
    }

    #[test]
    fn flags_override() {
        temp_env::with_vars([("PORTIER_SECRET", None::<&str>)], || {
            let matches = command().get_matches_from(vec![
                "portier",
                "--secret",
                "flag-secret",
                "--token-ttl",
                "60",
                "--hash-memory",
                "8",
                "--hash-iterations",
                "1",
                "--hash-parallelism",
                "1",
            ]);
            let options = Options::parse(&matches).unwrap();

            assert_eq!(options.secret.expose_secret(), "flag-secret");
            assert_eq!(options.token_ttl, Duration::from_secs(60));
            assert_eq!(
                options.hash_cost,
                HashCost {
                    memory_kib: 8,
                    iterations: 1,
                    parallelism: 1,
                }
            );
        });
    }

    #[test]
    fn secret_required() {
        temp_env::with_vars([("PORTIER_SECRET", None::<&str>)], || {
            let matches = command().get_matches_from(vec!["portier"]);
            let err = Options::parse(&matches).unwrap_err();

            assert!(err
                .to_string()
                .contains("missing required argument: --secret"));
        });
    }

    #[test]
    fn blank_secret_rejected() {
        temp_env::with_vars([("PORTIER_SECRET", Some("   "))], || {
            let matches = command().get_matches_from(vec!["portier"]);
            assert!(Options::parse(&matches).is_err());
        });
    }

    #[test]
    fn zero_ttl_rejected() {
        temp_env::with_vars([("PORTIER_SECRET", Some("s3cret"))], || {
            let result = command().try_get_matches_from(vec!["portier", "--token-ttl", "0"]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn debug_hides_secret() {
        temp_env::with_vars([("PORTIER_SECRET", Some("s3cret"))], || {
            let matches = command().get_matches_from(vec!["portier"]);
            let options = Options::parse(&matches).unwrap();

            assert!(!format!("{options:?}").contains("s3cret"));
        });
    }
}
