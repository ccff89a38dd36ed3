//! Listen-address configuration shared by every server implementation.
//!
//! `Config` is plain data. It is loaded by the application (a config file via
//! serde, or the environment via [`Config::from_env`]) and passed by value
//! into a concrete [`Server`](crate::Server). Implementations that need more
//! knobs wrap it in their own struct.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Port used when none is configured.
pub const DEFAULT_PORT: u16 = 8080;

/// Host/port pair a server binds to.
///
/// ```rust
/// use switchyard::Config;
///
/// let cfg: Config = serde_json::from_str(r#"{"port": 3000}"#).unwrap();
/// assert_eq!(cfg.addr(), ":3000");
/// assert_eq!(cfg.bind_host(), "0.0.0.0");
/// ```
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Config {
    /// Port to listen on. `0` asks the OS for an ephemeral port.
    pub port: u16,
    /// Host to bind to. Empty means all interfaces.
    pub host: String,
}

impl Config {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { port, host: host.into() }
    }

    /// Reads `HTTP_HOST` and `HTTP_PORT`, falling back to the defaults for
    /// unset variables.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Config::from_env) with an injected variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut cfg = Self::default();
        if let Some(host) = lookup("HTTP_HOST") {
            cfg.host = host;
        }
        if let Some(port) = lookup("HTTP_PORT") {
            cfg.port = port
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("HTTP_PORT `{port}` is not a valid TCP port")))?;
        }
        Ok(cfg)
    }

    /// Human-readable listen address: `"host:port"`, or `":port"` when the
    /// host is empty. IPv6 literals are bracketed.
    pub fn addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Host handed to the socket layer; the unspecified IPv4 address when empty.
    pub fn bind_host(&self) -> &str {
        match self.host.as_str() {
            "" => "0.0.0.0",
            host => host.trim_start_matches('[').trim_end_matches(']'),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { port: DEFAULT_PORT, host: String::new() }
    }
}
