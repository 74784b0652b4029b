use crate::media::TrackKind;
use crate::orchestrator::LinkState;
use proctor_core::LinkId;
use thiserror::Error;

/// Local media could not be acquired. Returned before any link exists.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("no {0} device available")]
    DeviceUnavailable(TrackKind),

    #[error("device error: {0}")]
    Device(String),

    #[error("capture has not been started")]
    NotStarted,
}

/// Failure scoped to a single link; siblings are unaffected.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("negotiation failed on link {link}: {reason}")]
    Negotiation { link: LinkId, reason: String },

    #[error("transport failed on link {link}: {reason}")]
    Transport { link: LinkId, reason: String },

    #[error("link {link} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        link: LinkId,
        from: LinkState,
        to: LinkState,
    },
}

impl LinkError {
    pub(crate) fn negotiation(link: LinkId, err: anyhow::Error) -> Self {
        LinkError::Negotiation {
            link,
            reason: format!("{err:#}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("participant session has stopped")]
    Stopped,
}
