use proctor_core::{Participant, ParticipantId, Role, SignalEnvelope};
use tokio::sync::mpsc;

/// Live registration of one participant inside a room.
pub(crate) struct Member {
    pub role: Role,
    pub joined_at: u64,
    pub epoch: u64,
    pub inbox: mpsc::UnboundedSender<SignalEnvelope>,
}

impl Member {
    pub fn describe(&self, id: &ParticipantId) -> Participant {
        Participant {
            id: id.clone(),
            role: self.role,
            joined_at: self.joined_at,
        }
    }

    /// `false` means the receiving side is gone.
    pub fn deliver(&self, envelope: SignalEnvelope) -> bool {
        self.inbox.send(envelope).is_ok()
    }
}
