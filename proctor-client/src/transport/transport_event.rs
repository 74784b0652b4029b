use crate::media::TrackInfo;
use proctor_core::{IceCandidate, LinkId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Emitted by a transport into its owner's event loop.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    StateChanged(LinkId, TransportState),
    CandidateGathered(LinkId, IceCandidate),
    TrackAdded(LinkId, TrackInfo),
}
