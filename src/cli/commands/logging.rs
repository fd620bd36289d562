use clap::{builder::ValueParser, Arg, ArgAction, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Level names in verbosity order; the index is the `-v` count.
pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Accepts a level name (any case) or its index in [`LOG_LEVELS`].
fn parse_log_level(level: &str) -> Result<u8, String> {
    let level = level.trim().to_lowercase();

    let index = match level.parse::<usize>() {
        Ok(index) if index < LOG_LEVELS.len() => Some(index),
        Ok(_) => None,
        Err(_) => LOG_LEVELS.iter().position(|name| *name == level),
    };

    index
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| format!("invalid log level, expected one of {}", LOG_LEVELS.join(", ")))
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Repeat to raise verbosity (error, warn, info, debug, trace)")
            .env("PORTIER_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(ValueParser::new(parse_log_level)),
    )
}
