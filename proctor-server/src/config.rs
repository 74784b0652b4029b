use crate::error::HubError;
use proctor_core::IceServerConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;

pub const BIND_ADDR_VAR: &str = "PROCTOR_BIND_ADDR";
pub const ICE_SERVERS_VAR: &str = "PROCTOR_ICE_SERVERS";
pub const SHARED_SECRET_VAR: &str = "PROCTOR_SHARED_SECRET";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Handed to clients through `GET /ice-servers`.
    pub ice_servers: Vec<IceServerConfig>,
    /// Enables [`SharedSecretAuthenticator`](crate::SharedSecretAuthenticator) when set.
    pub shared_secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            ice_servers: IceServerConfig::default_servers(),
            shared_secret: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, HubError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HubError> {
        let mut config = Self::default();

        if let Some(addr) = lookup(BIND_ADDR_VAR) {
            config.bind_addr = addr.parse().map_err(|e| HubError::Config {
                key: BIND_ADDR_VAR,
                reason: format!("{e} (expected something like {DEFAULT_BIND_ADDR})"),
            })?;
        }

        if let Some(json) = lookup(ICE_SERVERS_VAR) {
            config.ice_servers = serde_json::from_str(&json).map_err(|e| HubError::Config {
                key: ICE_SERVERS_VAR,
                reason: e.to_string(),
            })?;
        }

        config.shared_secret = lookup(SHARED_SECRET_VAR).filter(|s| !s.is_empty());

        Ok(config)
    }
}
