mod link;
mod participant;
mod room;
mod signaling;

pub use link::LinkId;
pub use participant::{Participant, ParticipantId, Role};
pub use room::RoomId;
pub use signaling::{
    IceCandidate, IceServerConfig, NegotiationMessage, Recipient, SignalEnvelope, now_millis,
};
