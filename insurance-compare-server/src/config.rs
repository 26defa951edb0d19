use anyhow::{Context, anyhow};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub comparison_api_url: String,
    pub bind_addr: IpAddr,
    pub port: u16,
    pub request_timeout: Duration,
}

impl ServerConfig {
    pub const DEFAULT_PORT: u16 = 3000;
    pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let comparison_api_url = lookup("COMPARISON_API_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow!("COMPARISON_API_URL environment variable is required"))?;

        let bind_addr = match lookup("BIND_ADDR") {
            Some(addr) => addr
                .parse::<IpAddr>()
                .with_context(|| format!("BIND_ADDR is not an IP address: {addr}"))?,
            None => IpAddr::from([0, 0, 0, 0]),
        };

        let port = match lookup("PORT") {
            Some(port) => port
                .parse::<u16>()
                .with_context(|| format!("PORT is not a valid port: {port}"))?,
            None => Self::DEFAULT_PORT,
        };

        let timeout_secs = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(secs) => secs
                .parse::<u64>()
                .with_context(|| format!("REQUEST_TIMEOUT_SECS is not a number: {secs}"))?,
            None => Self::DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(anyhow!("REQUEST_TIMEOUT_SECS must be greater than zero"));
        }

        Ok(Self {
            comparison_api_url,
            bind_addr,
            port,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}
