use proctor_core::ParticipantId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a link from the local participant's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkDirection {
    /// The local participant consumes the remote's capture.
    Pull,
    /// The local capture flows to the remote.
    Push,
}

impl fmt::Display for LinkDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkDirection::Pull => f.write_str("pull"),
            LinkDirection::Push => f.write_str("push"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkRole {
    Offerer,
    Answerer,
}

impl LinkRole {
    /// The consumer of a stream offers.
    pub fn for_direction(direction: LinkDirection) -> Self {
        match direction {
            LinkDirection::Pull => LinkRole::Offerer,
            LinkDirection::Push => LinkRole::Answerer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkState {
    Idle,
    OfferSent,
    AnswerSent,
    Connected,
    Disconnected,
    Closed,
}

impl LinkState {
    pub fn can_transition_to(self, next: LinkState) -> bool {
        use LinkState::*;

        matches!(
            (self, next),
            (Idle, OfferSent)
                | (Idle, AnswerSent)
                | (OfferSent, Connected)
                | (AnswerSent, Connected)
                | (Connected, Disconnected)
                | (Idle | OfferSent | AnswerSent | Connected | Disconnected, Closed)
        )
    }

    pub fn is_closed(self) -> bool {
        self == LinkState::Closed
    }
}

/// Identity of a link slot: at most one live link per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkKey {
    pub remote: ParticipantId,
    pub direction: LinkDirection,
}

impl LinkKey {
    pub fn new(remote: ParticipantId, direction: LinkDirection) -> Self {
        Self { remote, direction }
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.remote, self.direction)
    }
}
