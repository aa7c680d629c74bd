// SPDX-License-Identifier: Apache-2.0
//! Command-line configuration.
//!
//! A `clap::Parser`-derived struct, same shape as
//! `echo-session-ws-gateway::Args`. Unknown flags and parse failures fall
//! back to defaults and keep the process running rather than exiting, so
//! [`Config::parse_or_default`] wraps `try_parse_from` instead of clap's
//! default `parse`.

use std::path::PathBuf;

use clap::Parser;

/// Process-wide configuration, parsed from the command line.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "Aethership simulation server")]
pub struct Config {
    /// TCP port the WebSocket endpoint listens on.
    #[arg(long, default_value_t = 7777)]
    pub port: u16,

    /// World generation seed, used only when no checkpoint database exists
    /// yet — an existing database's stored seed always wins.
    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// Path to the SQLite checkpoint file.
    #[arg(long, default_value = "aethership.db")]
    pub db: PathBuf,

    /// Maximum concurrently registered players; further `register` attempts
    /// are rejected with `RegistrationClosed` once reached.
    #[arg(long, default_value_t = 100)]
    pub max_players: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 7777,
            seed: 1,
            db: PathBuf::from("aethership.db"),
            max_players: 100,
        }
    }
}

impl Config {
    /// Parses `args`, falling back to [`Config::default`] on any error
    /// (unknown flag, bad value) instead of exiting the process.
    #[must_use]
    pub fn parse_or_default<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        match Self::try_parse_from(args) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(%err, "invalid command-line arguments, using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_flags() {
        let config = Config::parse_or_default([
            "aethership-server",
            "--port",
            "9000",
            "--seed",
            "42",
            "--max-players",
            "8",
        ]);
        assert_eq!(config.port, 9000);
        assert_eq!(config.seed, 42);
        assert_eq!(config.max_players, 8);
    }

    #[test]
    fn falls_back_to_defaults_on_bad_value() {
        let config = Config::parse_or_default(["aethership-server", "--port", "not-a-port"]);
        assert_eq!(config.port, Config::default().port);
    }

    #[test]
    fn falls_back_to_defaults_on_unknown_flag() {
        let config = Config::parse_or_default(["aethership-server", "--does-not-exist", "x"]);
        assert_eq!(config.port, Config::default().port);
    }
}
