// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Daemon configuration from command-line flags and environment variables.
//!
//! Every flag falls back to an environment variable, so the daemon can be
//! configured either way; flags win when both are present.

use std::fmt;

use clap::{Parser, ValueEnum};

/// Log verbosity for the daemon.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum LogLevel {
    /// Log everything, including per-request tracing.
    Debug,
    /// Log lifecycle events and dropped requests.
    Info,
    /// Log anomalies only.
    Warn,
    /// Log failures only.
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(s)
    }
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

/// Configuration for the `timewarpd` daemon.
#[derive(Clone, Debug, Parser)]
#[command(
    name = "timewarpd",
    version,
    about = "Development NTP server with per-client virtual clocks"
)]
pub struct Config {
    /// Host name or address the NTP server listens on.
    #[arg(long = "host", env = "NTP_HOST", default_value = "localhost")]
    pub ntp_host: String,

    /// UDP port the NTP server listens on.
    #[arg(long = "port", env = "NTP_PORT", default_value_t = timewarp::protocol::PORT)]
    pub ntp_port: u16,

    /// Host name or address the control-plane HTTP server listens on.
    #[arg(long = "web-host", env = "WEB_HOST", default_value = "localhost")]
    pub web_host: String,

    /// TCP port the control-plane HTTP server listens on.
    #[arg(long = "web-port", env = "WEB_PORT", default_value_t = 80)]
    pub web_port: u16,

    /// Log verbosity.
    #[arg(
        long = "log-level",
        env = "LOGLEVEL",
        value_enum,
        default_value_t = LogLevel::Debug
    )]
    pub log_level: LogLevel,
}

impl Config {
    /// The NTP listen address as a `host:port` string.
    pub fn ntp_addr(&self) -> String {
        format!("{}:{}", self.ntp_host, self.ntp_port)
    }

    /// The control-plane listen address as a `host:port` string.
    pub fn web_addr(&self) -> String {
        format!("{}:{}", self.web_host, self.web_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::parse_from(["timewarpd"]);
        assert_eq!(config.ntp_host, "localhost");
        assert_eq!(config.ntp_port, 123);
        assert_eq!(config.web_host, "localhost");
        assert_eq!(config.web_port, 80);
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::parse_from([
            "timewarpd",
            "--host",
            "0.0.0.0",
            "--port",
            "10123",
            "--web-host",
            "127.0.0.1",
            "--web-port",
            "8080",
            "--log-level",
            "warn",
        ]);
        assert_eq!(config.ntp_addr(), "0.0.0.0:10123");
        assert_eq!(config.web_addr(), "127.0.0.1:8080");
        assert_eq!(config.log_level, LogLevel::Warn);
    }

    #[test]
    fn log_level_filter_mapping() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
    }
}
