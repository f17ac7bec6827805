//! Server configuration
//!
//! Parsed from the command line with clap. The listening port can also come
//! from `KVSTOR_PORT`; nothing else reads the environment.

use crate::protocol::ResponseStyle;
use crate::storage::ExpiryConfig;
use clap::Parser;
use std::time::Duration;

/// KVStor server options
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "kvstor")]
#[command(about = "In-memory key-value store with per-key TTL over a line protocol")]
#[command(version)]
pub struct Config {
    /// Host to bind to
    #[arg(long, default_value = crate::DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "KVSTOR_PORT", default_value_t = crate::DEFAULT_PORT)]
    pub port: u16,

    /// Seconds between background expiry sweeps
    #[arg(
        long = "sweep-interval",
        value_name = "SECS",
        default_value_t = crate::DEFAULT_SWEEP_INTERVAL.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub sweep_interval_secs: u64,

    /// TTL in seconds for `set` commands that omit one
    #[arg(long = "default-ttl", value_name = "SECS", default_value_t = crate::DEFAULT_TTL_SECS)]
    pub default_ttl_secs: u64,

    /// Highlight keys and values in responses with ANSI colors
    #[arg(long)]
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: crate::DEFAULT_HOST.to_string(),
            port: crate::DEFAULT_PORT,
            sweep_interval_secs: crate::DEFAULT_SWEEP_INTERVAL.as_secs(),
            default_ttl_secs: crate::DEFAULT_TTL_SECS,
            color: false,
        }
    }
}

impl Config {
    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn expiry(&self) -> ExpiryConfig {
        ExpiryConfig {
            interval: Duration::from_secs(self.sweep_interval_secs),
        }
    }

    pub fn response_style(&self) -> ResponseStyle {
        if self.color {
            ResponseStyle::Highlighted
        } else {
            ResponseStyle::Plain
        }
    }
}
