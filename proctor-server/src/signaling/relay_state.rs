use crate::auth::{Authenticator, SharedSecretAuthenticator, TrustedIdentity};
use crate::config::ServerConfig;
use crate::hub::SignalingHub;
use proctor_core::IceServerConfig;
use std::sync::Arc;

/// Shared state behind every relay route.
#[derive(Clone)]
pub struct RelayState {
    pub hub: SignalingHub,
    pub authenticator: Arc<dyn Authenticator>,
    pub ice_servers: Arc<Vec<IceServerConfig>>,
}

impl RelayState {
    pub fn new(
        hub: SignalingHub,
        authenticator: Arc<dyn Authenticator>,
        ice_servers: Vec<IceServerConfig>,
    ) -> Self {
        Self {
            hub,
            authenticator,
            ice_servers: Arc::new(ice_servers),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        let authenticator: Arc<dyn Authenticator> = match &config.shared_secret {
            Some(secret) => Arc::new(SharedSecretAuthenticator::new(secret.clone())),
            None => Arc::new(TrustedIdentity),
        };
        Self::new(SignalingHub::new(), authenticator, config.ice_servers.clone())
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.ice_servers.as_ref().clone()
    }
}
