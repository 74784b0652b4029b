use crate::media::StreamView;
use proctor_core::{LinkId, Participant, ParticipantId};

/// One-way notifications from the orchestrator.
#[derive(Debug, Clone)]
pub enum RegistryEvent {
    ParticipantJoined(Participant),
    ParticipantLeft(ParticipantId),
    StreamAttached {
        participant: ParticipantId,
        link: LinkId,
        stream: StreamView,
    },
    /// Only removes the entry if it still belongs to `link`.
    StreamDetached {
        participant: ParticipantId,
        link: LinkId,
    },
    /// The local participant left the room.
    Cleared,
}

/// What presentation observers are told.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryChange {
    ParticipantJoined(ParticipantId),
    ParticipantLeft(ParticipantId),
    StreamAttached(ParticipantId),
    StreamDetached(ParticipantId),
    LocalStreamChanged,
    Cleared,
}
