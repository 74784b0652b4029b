use proctor_core::{ParticipantId, RoomId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("authentication failed for {participant} in room {room}: {reason}")]
    Authentication {
        room: RoomId,
        participant: ParticipantId,
        reason: String,
    },

    #[error("invalid value for {key}: {reason}")]
    Config { key: &'static str, reason: String },
}
