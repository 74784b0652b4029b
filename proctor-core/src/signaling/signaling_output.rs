use crate::model::{ParticipantId, Role, RoomId, SignalEnvelope};

/// One registration of a participant in a room. `epoch` tells a replaced
/// registration apart from the live one that reused the same id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub room: RoomId,
    pub participant: ParticipantId,
    pub role: Role,
    pub epoch: u64,
}

/// Relay side of a [`Subscription`](crate::Subscription).
///
/// Implemented by the signaling hub; anything that can route envelopes
/// between members of a room can stand in for it.
pub trait SignalingOutput: Send + Sync + 'static {
    /// Route an envelope on behalf of `membership`. Returns how many inboxes
    /// received it. Stale memberships deliver nothing.
    fn publish_from(&self, membership: &Membership, envelope: SignalEnvelope) -> usize;

    /// End `membership`. Must be idempotent.
    fn release(&self, membership: &Membership);
}
