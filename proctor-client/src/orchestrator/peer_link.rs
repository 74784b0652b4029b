use crate::error::LinkError;
use crate::media::{StreamHandle, StreamView, TrackInfo};
use crate::orchestrator::link_state::{LinkDirection, LinkKey, LinkRole, LinkState};
use crate::orchestrator::orchestrator_command::LinkSnapshot;
use crate::transport::{MediaTransport, SdpKind, TransportState};
use proctor_core::{IceCandidate, LinkId, ParticipantId};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info};

/// What a transport state change means for the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTransition {
    None,
    Connected,
    /// Transport went away after connecting.
    Lost,
    /// Transport gave up before ever connecting.
    Failed,
}

/// Negotiation and media state for one `(remote, direction)` pair.
pub struct PeerLink {
    id: LinkId,
    key: LinkKey,
    role: LinkRole,
    state: LinkState,
    transport: Arc<dyn MediaTransport>,
    pending_candidates: VecDeque<IceCandidate>,
    remote_description_set: bool,
    remote_tracks: Vec<TrackInfo>,
    remote_stream: Option<StreamHandle>,
}

impl PeerLink {
    pub fn new(id: LinkId, key: LinkKey, transport: Arc<dyn MediaTransport>) -> Self {
        Self {
            id,
            role: LinkRole::for_direction(key.direction),
            key,
            state: LinkState::Idle,
            transport,
            pending_candidates: VecDeque::new(),
            remote_description_set: false,
            remote_tracks: Vec::new(),
            remote_stream: None,
        }
    }

    pub fn id(&self) -> LinkId {
        self.id
    }

    pub fn key(&self) -> &LinkKey {
        &self.key
    }

    pub fn remote(&self) -> &ParticipantId {
        &self.key.remote
    }

    pub fn direction(&self) -> LinkDirection {
        self.key.direction
    }

    pub fn role(&self) -> LinkRole {
        self.role
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    pub fn has_remote_description(&self) -> bool {
        self.remote_description_set
    }

    pub fn snapshot(&self) -> LinkSnapshot {
        LinkSnapshot {
            link: self.id,
            remote: self.key.remote.clone(),
            direction: self.key.direction,
            role: self.role,
            state: self.state,
            pending_candidates: self.pending_candidates.len(),
        }
    }

    /// Offerer only. Produces the offer, already applied locally.
    pub async fn create_offer(&mut self) -> Result<String, LinkError> {
        self.check_transition(LinkState::OfferSent)?;
        let sdp = self
            .transport
            .create_offer()
            .await
            .map_err(|e| LinkError::negotiation(self.id, e))?;
        self.transition(LinkState::OfferSent)?;
        Ok(sdp)
    }

    /// Answerer only. Applies the remote offer, flushes buffered candidates,
    /// and produces the answer.
    pub async fn accept_offer(&mut self, sdp: String) -> Result<String, LinkError> {
        self.check_transition(LinkState::AnswerSent)?;
        self.apply_remote_description(SdpKind::Offer, sdp).await?;
        let answer = self
            .transport
            .create_answer()
            .await
            .map_err(|e| LinkError::negotiation(self.id, e))?;
        self.transition(LinkState::AnswerSent)?;
        Ok(answer)
    }

    pub async fn accept_answer(&mut self, sdp: String) -> Result<(), LinkError> {
        if self.state != LinkState::OfferSent || self.remote_description_set {
            return Err(LinkError::Negotiation {
                link: self.id,
                reason: format!("unexpected answer in state {:?}", self.state),
            });
        }
        self.apply_remote_description(SdpKind::Answer, sdp).await
    }

    /// Buffers until the remote description is set, applies directly after.
    pub async fn add_remote_candidate(&mut self, candidate: IceCandidate) -> Result<(), LinkError> {
        if self.state.is_closed() {
            return Ok(());
        }
        if !self.remote_description_set {
            self.pending_candidates.push_back(candidate);
            debug!(link = %self.id, buffered = self.pending_candidates.len(), "Buffering ICE candidate");
            return Ok(());
        }
        self.transport
            .add_ice_candidate(candidate)
            .await
            .map_err(|e| LinkError::negotiation(self.id, e))
    }

    pub fn on_transport_state(&mut self, state: TransportState) -> LinkTransition {
        match (state, self.state) {
            (TransportState::Connected, LinkState::OfferSent | LinkState::AnswerSent)
                if self.remote_description_set =>
            {
                self.state = LinkState::Connected;
                LinkTransition::Connected
            }
            (
                TransportState::Disconnected | TransportState::Failed | TransportState::Closed,
                LinkState::Connected,
            ) => {
                self.state = LinkState::Disconnected;
                LinkTransition::Lost
            }
            (
                TransportState::Failed | TransportState::Closed,
                LinkState::Idle | LinkState::OfferSent | LinkState::AnswerSent,
            ) => LinkTransition::Failed,
            _ => LinkTransition::None,
        }
    }

    /// Error for a `Lost` or `Failed` transition reported by the transport.
    pub fn transport_failure(&self, transition: LinkTransition, state: TransportState) -> LinkError {
        let reason = match transition {
            LinkTransition::Lost => format!("connection lost ({state:?})"),
            _ => format!("gave up before connecting ({state:?})"),
        };
        LinkError::Transport {
            link: self.id,
            reason,
        }
    }

    /// Remote track seen on this link; the stream picks it up if it exists.
    pub fn record_track(&mut self, track: TrackInfo) {
        if let Some(stream) = &self.remote_stream {
            stream.add_track(track.clone());
        }
        self.remote_tracks.retain(|t| t.id != track.id);
        self.remote_tracks.push(track);
    }

    /// Create the receiving-side stream of a connected `Pull` link.
    pub fn open_remote_stream(&mut self) -> Option<StreamView> {
        if self.key.direction != LinkDirection::Pull || self.state != LinkState::Connected {
            return None;
        }
        let handle = self
            .remote_stream
            .get_or_insert_with(|| StreamHandle::new(self.key.remote.clone(), self.remote_tracks.clone()));
        Some(handle.view())
    }

    /// Mark closed, drop buffered candidates, revoke the remote stream and
    /// tear the transport down in the background. Returns `false` if it was
    /// already closed.
    pub fn close(&mut self) -> bool {
        if self.state.is_closed() {
            return false;
        }
        self.state = LinkState::Closed;
        self.pending_candidates.clear();
        self.remote_stream.take();

        let transport = self.transport.clone();
        let link = self.id;
        match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = transport.close().await {
                        debug!(%link, "Transport close failed: {:#}", e);
                    }
                });
            }
            Err(_) => debug!(%link, "No runtime, transport dropped without close"),
        }

        info!(link = %self.id, key = %self.key, "Link closed");
        true
    }

    async fn apply_remote_description(&mut self, kind: SdpKind, sdp: String) -> Result<(), LinkError> {
        self.transport
            .set_remote_description(kind, sdp)
            .await
            .map_err(|e| LinkError::negotiation(self.id, e))?;
        self.remote_description_set = true;

        while let Some(candidate) = self.pending_candidates.pop_front() {
            self.transport
                .add_ice_candidate(candidate)
                .await
                .map_err(|e| LinkError::negotiation(self.id, e))?;
        }
        Ok(())
    }

    fn check_transition(&self, next: LinkState) -> Result<(), LinkError> {
        let role_ok = match next {
            LinkState::OfferSent => self.role == LinkRole::Offerer,
            LinkState::AnswerSent => self.role == LinkRole::Answerer,
            _ => true,
        };
        if role_ok && self.state.can_transition_to(next) {
            Ok(())
        } else {
            Err(LinkError::InvalidTransition {
                link: self.id,
                from: self.state,
                to: next,
            })
        }
    }

    fn transition(&mut self, next: LinkState) -> Result<(), LinkError> {
        self.check_transition(next)?;
        self.state = next;
        Ok(())
    }
}

impl Drop for PeerLink {
    fn drop(&mut self) {
        self.close();
    }
}
