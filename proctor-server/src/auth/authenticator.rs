use crate::error::HubError;
use async_trait::async_trait;
use proctor_core::{ParticipantId, Role, RoomId};

/// What a connecting client claims to be, before validation.
#[derive(Debug, Clone)]
pub struct IdentityClaim {
    pub room: RoomId,
    pub participant: ParticipantId,
    pub role: Role,
    pub token: Option<String>,
}

/// Validated identity; the relay stamps it on everything the client sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub room: RoomId,
    pub participant: ParticipantId,
    pub role: Role,
}

impl From<IdentityClaim> for Identity {
    fn from(claim: IdentityClaim) -> Self {
        Self {
            room: claim.room,
            participant: claim.participant,
            role: claim.role,
        }
    }
}

/// Gate in front of the hub. Runs before any subscription is created.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, claim: IdentityClaim) -> Result<Identity, HubError>;
}

/// Accepts every claim. For deployments where an upstream proxy already
/// validated the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrustedIdentity;

#[async_trait]
impl Authenticator for TrustedIdentity {
    async fn authenticate(&self, claim: IdentityClaim) -> Result<Identity, HubError> {
        Ok(claim.into())
    }
}

/// Requires the connection token to equal a pre-shared secret.
#[derive(Clone)]
pub struct SharedSecretAuthenticator {
    secret: String,
}

impl SharedSecretAuthenticator {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

#[async_trait]
impl Authenticator for SharedSecretAuthenticator {
    async fn authenticate(&self, claim: IdentityClaim) -> Result<Identity, HubError> {
        let reason = match claim.token.as_deref() {
            None => "missing token",
            Some(token) if token != self.secret => "token mismatch",
            Some(_) => return Ok(claim.into()),
        };

        Err(HubError::Authentication {
            room: claim.room,
            participant: claim.participant,
            reason: reason.to_owned(),
        })
    }
}
