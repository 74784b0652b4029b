use crate::orchestrator::link_state::{LinkDirection, LinkRole, LinkState};
use proctor_core::{LinkId, ParticipantId};
use tokio::sync::oneshot;

#[derive(Debug)]
pub enum OrchestratorCommand {
    /// Tear down one link; replies whether it existed.
    CloseLink {
        remote: ParticipantId,
        direction: LinkDirection,
        reply: oneshot::Sender<bool>,
    },

    Links { reply: oneshot::Sender<Vec<LinkSnapshot>> },

    /// Leave the room and stop. `done` fires once every link is closed.
    Leave { done: oneshot::Sender<()> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSnapshot {
    pub link: LinkId,
    pub remote: ParticipantId,
    pub direction: LinkDirection,
    pub role: LinkRole,
    pub state: LinkState,
    pub pending_candidates: usize,
}
