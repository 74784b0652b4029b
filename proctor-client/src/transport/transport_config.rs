use proctor_core::IceServerConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
    /// Gather 127.0.0.1 candidates. Only useful when both ends share a host.
    #[serde(default)]
    pub include_loopback_candidates: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: IceServerConfig::default_servers(),
            include_loopback_candidates: false,
        }
    }
}

impl TransportConfig {
    /// No STUN/TURN, loopback only. Both peers must run on this machine.
    pub fn local_only() -> Self {
        Self {
            ice_servers: Vec::new(),
            include_loopback_candidates: true,
        }
    }
}
