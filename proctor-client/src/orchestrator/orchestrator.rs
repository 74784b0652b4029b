use crate::capture::LocalMedia;
use crate::error::SessionError;
use crate::orchestrator::link_state::{LinkDirection, LinkKey};
use crate::orchestrator::orchestrator_command::{LinkSnapshot, OrchestratorCommand};
use crate::orchestrator::orchestrator_config::OrchestratorConfig;
use crate::orchestrator::peer_link::{LinkTransition, PeerLink};
use crate::registry::RegistryEvent;
use crate::transport::{LinkSetup, TransportEvent, TransportFactory};
use proctor_core::{
    IceCandidate, LinkId, NegotiationMessage, Participant, ParticipantId, Role, SignalEnvelope,
    Subscription,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Candidates that arrived ahead of their offer.
struct OrphanCandidates {
    from: ParticipantId,
    candidates: VecDeque<IceCandidate>,
}

/// Cheap handle for talking to a running [`Orchestrator`].
#[derive(Clone)]
pub struct OrchestratorHandle {
    command_tx: mpsc::Sender<OrchestratorCommand>,
}

impl OrchestratorHandle {
    pub async fn links(&self) -> Result<Vec<LinkSnapshot>, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.command(OrchestratorCommand::Links { reply }).await?;
        rx.await.map_err(|_| SessionError::Stopped)
    }

    pub async fn close_link(
        &self,
        remote: ParticipantId,
        direction: LinkDirection,
    ) -> Result<bool, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.command(OrchestratorCommand::CloseLink {
            remote,
            direction,
            reply,
        })
        .await?;
        rx.await.map_err(|_| SessionError::Stopped)
    }

    /// Resolves once the room is left and every link is closed.
    pub async fn leave(&self) -> Result<(), SessionError> {
        let (done, rx) = oneshot::channel();
        self.command(OrchestratorCommand::Leave { done }).await?;
        rx.await.map_err(|_| SessionError::Stopped)
    }

    pub fn is_running(&self) -> bool {
        !self.command_tx.is_closed()
    }

    async fn command(&self, command: OrchestratorCommand) -> Result<(), SessionError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| SessionError::Stopped)
    }
}

/// Runs every peer link of one participant.
///
/// A single task owns all link state and reacts, one step at a time, to
/// operator commands, envelopes from the hub and transport events.
pub struct Orchestrator {
    subscription: Subscription,
    config: OrchestratorConfig,
    transports: Arc<dyn TransportFactory>,
    local_media: Option<LocalMedia>,
    links: HashMap<LinkKey, PeerLink>,
    link_index: HashMap<LinkId, LinkKey>,
    /// Ids of links that are gone, with the remote they belonged to.
    retired: HashMap<LinkId, ParticipantId>,
    orphans: HashMap<LinkId, OrphanCandidates>,
    roster: HashMap<ParticipantId, Role>,
    command_rx: mpsc::Receiver<OrchestratorCommand>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    transport_tx: mpsc::Sender<TransportEvent>,
    registry: mpsc::UnboundedSender<RegistryEvent>,
}

impl Orchestrator {
    pub fn new(
        subscription: Subscription,
        config: OrchestratorConfig,
        transports: Arc<dyn TransportFactory>,
        local_media: Option<LocalMedia>,
        registry: mpsc::UnboundedSender<RegistryEvent>,
    ) -> (Self, OrchestratorHandle) {
        let (command_tx, command_rx) = mpsc::channel(100);
        let (transport_tx, transport_rx) = mpsc::channel(256);

        let orchestrator = Self {
            subscription,
            config,
            transports,
            local_media,
            links: HashMap::new(),
            link_index: HashMap::new(),
            retired: HashMap::new(),
            orphans: HashMap::new(),
            roster: HashMap::new(),
            command_rx,
            transport_rx,
            transport_tx,
            registry,
        };
        (orchestrator, OrchestratorHandle { command_tx })
    }

    pub fn participant(&self) -> &ParticipantId {
        self.subscription.participant()
    }

    pub async fn run(mut self) {
        info!(participant = %self.participant(), room = %self.subscription.room(), "Orchestrator started");

        loop {
            tokio::select! {
                biased;

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(OrchestratorCommand::Leave { done }) => {
                            self.shutdown();
                            let _ = done.send(());
                            break;
                        }
                        Some(c) => self.handle_command(c),
                        None => {
                            info!("Command channel closed. Leaving room.");
                            self.shutdown();
                            break;
                        }
                    }
                }

                envelope = self.subscription.recv() => {
                    match envelope {
                        Some(e) => self.handle_envelope(e).await,
                        None => {
                            warn!(participant = %self.participant(), "Signaling subscription closed");
                            self.shutdown();
                            break;
                        }
                    }
                }

                Some(evt) = self.transport_rx.recv() => {
                    self.handle_transport_event(evt);
                }
            }
        }

        info!(participant = %self.participant(), "Orchestrator finished");
    }

    fn handle_command(&mut self, cmd: OrchestratorCommand) {
        match cmd {
            OrchestratorCommand::CloseLink {
                remote,
                direction,
                reply,
            } => {
                let existed = self.remove_link(&LinkKey::new(remote, direction), "closed by operator");
                let _ = reply.send(existed);
            }
            OrchestratorCommand::Links { reply } => {
                let mut snapshots: Vec<_> = self.links.values().map(PeerLink::snapshot).collect();
                snapshots.sort_by(|a, b| {
                    (&a.remote, a.direction).cmp(&(&b.remote, b.direction))
                });
                let _ = reply.send(snapshots);
            }
            OrchestratorCommand::Leave { done } => {
                self.shutdown();
                let _ = done.send(());
            }
        }
    }

    async fn handle_envelope(&mut self, envelope: SignalEnvelope) {
        let SignalEnvelope {
            from,
            message,
            sent_at,
            ..
        } = envelope;

        if &from == self.participant() {
            return;
        }

        match message {
            NegotiationMessage::Join { role } => self.on_join(from, role, sent_at).await,
            NegotiationMessage::Leave => self.on_leave(from),
            NegotiationMessage::Offer { link, source, sdp } => {
                self.on_offer(from, link, source, sdp).await
            }
            NegotiationMessage::Answer { link, sdp } => self.on_answer(from, link, sdp).await,
            NegotiationMessage::IceCandidate { link, candidate } => {
                self.on_remote_candidate(from, link, candidate).await
            }
        }
    }

    async fn on_join(&mut self, from: ParticipantId, role: Role, joined_at: u64) {
        if self.roster.insert(from.clone(), role).is_none() {
            let _ = self.registry.send(RegistryEvent::ParticipantJoined(Participant {
                id: from.clone(),
                role,
                joined_at,
            }));
        }

        if self.should_pull(role) {
            self.open_pull(from).await;
        }
    }

    fn on_leave(&mut self, from: ParticipantId) {
        info!(participant = %self.participant(), remote = %from, "Remote left");
        self.roster.remove(&from);

        let keys: Vec<_> = self.links.keys().filter(|k| k.remote == from).cloned().collect();
        for key in keys {
            self.remove_link(&key, "remote left");
        }
        self.orphans.retain(|_, o| o.from != from);
        self.retired.retain(|_, remote| remote != &from);

        let _ = self.registry.send(RegistryEvent::ParticipantLeft(from));
    }

    async fn on_offer(&mut self, from: ParticipantId, link_id: LinkId, source: ParticipantId, sdp: String) {
        if &source != self.participant() {
            warn!(remote = %from, %source, "Dropping offer for a capture we do not own");
            self.refuse_offer(link_id, &from);
            return;
        }
        if !self.serves(&from) {
            debug!(remote = %from, "Not publishing capture to this participant");
            self.refuse_offer(link_id, &from);
            return;
        }
        if self.retired.contains_key(&link_id) {
            debug!(link = %link_id, "Dropping offer for retired link");
            return;
        }

        let key = LinkKey::new(from.clone(), LinkDirection::Push);
        if let Some(existing) = self.links.get(&key) {
            if existing.id() == link_id {
                debug!(link = %link_id, "Duplicate offer ignored");
                return;
            }
            self.remove_link(&key, "replaced by new offer");
        }

        let Some(mut link) = self.build_link(link_id, key).await else {
            return;
        };

        if let Some(orphans) = self.orphans.remove(&link_id) {
            debug!(link = %link_id, count = orphans.candidates.len(), "Replaying early candidates");
            for candidate in orphans.candidates {
                // No remote description yet, so these only queue.
                let _ = link.add_remote_candidate(candidate).await;
            }
        }

        match link.accept_offer(sdp).await {
            Ok(answer) => {
                self.send(from, NegotiationMessage::Answer {
                    link: link_id,
                    sdp: answer,
                });
                self.insert_link(link);
            }
            Err(e) => {
                warn!(key = %link.key(), "Aborting link: {}", e);
                self.retire(link_id, link.remote());
                link.close();
            }
        }
    }

    async fn on_answer(&mut self, from: ParticipantId, link_id: LinkId, sdp: String) {
        let Some(key) = self.link_index.get(&link_id).cloned() else {
            debug!(link = %link_id, remote = %from, "Answer for unknown or stale link dropped");
            return;
        };
        if key.remote != from {
            debug!(link = %link_id, remote = %from, "Answer from wrong participant dropped");
            return;
        }
        let Some(link) = self.links.get_mut(&key) else {
            return;
        };
        if link.has_remote_description() {
            debug!(link = %link_id, "Duplicate answer dropped");
            return;
        }

        if let Err(e) = link.accept_answer(sdp).await {
            warn!(%key, "Aborting link: {}", e);
            self.remove_link(&key, "negotiation failed");
        }
    }

    async fn on_remote_candidate(&mut self, from: ParticipantId, link_id: LinkId, candidate: IceCandidate) {
        if let Some(key) = self.link_index.get(&link_id).cloned() {
            if key.remote != from {
                return;
            }
            let Some(link) = self.links.get_mut(&key) else {
                return;
            };
            if let Err(e) = link.add_remote_candidate(candidate).await {
                warn!(%key, "Aborting link: {}", e);
                self.remove_link(&key, "candidate rejected");
            }
            return;
        }

        if self.retired.contains_key(&link_id) {
            debug!(link = %link_id, "Candidate for retired link dropped");
            return;
        }

        let max = self.config.max_orphan_candidates;
        let orphans = self.orphans.entry(link_id).or_insert_with(|| OrphanCandidates {
            from: from.clone(),
            candidates: VecDeque::new(),
        });
        if orphans.from != from {
            debug!(link = %link_id, remote = %from, "Early candidate from another participant dropped");
            return;
        }
        if max.is_some_and(|max| orphans.candidates.len() >= max) {
            warn!(link = %link_id, remote = %from, held = orphans.candidates.len(), "Early candidate limit reached, dropping candidate");
            return;
        }
        orphans.candidates.push_back(candidate);
        debug!(link = %link_id, held = orphans.candidates.len(), "Holding candidate until its offer arrives");
    }

    fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::CandidateGathered(link_id, candidate) => {
                let Some(key) = self.link_index.get(&link_id) else {
                    return;
                };
                let remote = key.remote.clone();
                self.send(remote, NegotiationMessage::IceCandidate {
                    link: link_id,
                    candidate,
                });
            }

            TransportEvent::StateChanged(link_id, state) => {
                let Some(key) = self.link_index.get(&link_id).cloned() else {
                    return;
                };
                let Some(link) = self.links.get_mut(&key) else {
                    return;
                };

                match link.on_transport_state(state) {
                    LinkTransition::Connected => {
                        info!(%key, link = %link_id, "Link connected");
                        if let Some(stream) = link.open_remote_stream() {
                            let _ = self.registry.send(RegistryEvent::StreamAttached {
                                participant: key.remote.clone(),
                                link: link_id,
                                stream,
                            });
                        }
                    }
                    transition @ (LinkTransition::Lost | LinkTransition::Failed) => {
                        let err = link.transport_failure(transition, state);
                        warn!(%key, "Removing link: {}", err);
                        self.remove_link(&key, "transport failure");
                    }
                    LinkTransition::None => {}
                }
            }

            TransportEvent::TrackAdded(link_id, track) => {
                let Some(key) = self.link_index.get(&link_id) else {
                    return;
                };
                if let Some(link) = self.links.get_mut(key) {
                    link.record_track(track);
                }
            }
        }
    }

    /// Leave the hub, then close every link.
    fn shutdown(&mut self) {
        self.subscription.leave();

        let keys: Vec<_> = self.links.keys().cloned().collect();
        for key in keys {
            self.remove_link(&key, "leaving room");
        }
        self.orphans.clear();
        self.roster.clear();

        let _ = self.registry.send(RegistryEvent::Cleared);
        info!(participant = %self.participant(), "Left room");
    }

    fn should_pull(&self, remote_role: Role) -> bool {
        match (self.subscription.role(), remote_role) {
            (Role::Proctor, Role::Candidate) => true,
            (Role::Candidate, Role::Proctor) => self.config.accept_proctor_feed,
            _ => false,
        }
    }

    /// Whether our capture may flow to `remote` on request.
    fn serves(&self, remote: &ParticipantId) -> bool {
        match (self.subscription.role(), self.roster.get(remote)) {
            (Role::Candidate, Some(Role::Candidate)) => false,
            (Role::Candidate, _) => true,
            (Role::Proctor, _) => self.config.push_camera,
        }
    }

    async fn open_pull(&mut self, remote: ParticipantId) {
        let key = LinkKey::new(remote.clone(), LinkDirection::Pull);
        if let Some(existing) = self.links.get(&key) {
            debug!(%key, link = %existing.id(), "Link already live, duplicate join ignored");
            return;
        }

        let link_id = LinkId::new();
        let Some(mut link) = self.build_link(link_id, key).await else {
            return;
        };

        match link.create_offer().await {
            Ok(sdp) => {
                self.send(remote.clone(), NegotiationMessage::Offer {
                    link: link_id,
                    source: remote,
                    sdp,
                });
                self.insert_link(link);
            }
            Err(e) => {
                warn!(key = %link.key(), "Aborting link: {}", e);
                self.retire(link_id, link.remote());
                link.close();
            }
        }
    }

    async fn build_link(&mut self, link_id: LinkId, key: LinkKey) -> Option<PeerLink> {
        let local_tracks = match (key.direction, &self.local_media) {
            (LinkDirection::Push, Some(media)) => media.tracks.clone(),
            _ => Vec::new(),
        };
        let setup = LinkSetup {
            link: link_id,
            remote: key.remote.clone(),
            direction: key.direction,
            local_tracks,
            config: self.config.transport.clone(),
        };

        match self.transports.create(setup, self.transport_tx.clone()).await {
            Ok(transport) => {
                debug!(%key, link = %link_id, "Link created");
                Some(PeerLink::new(link_id, key, transport))
            }
            Err(e) => {
                warn!(%key, link = %link_id, "Failed to create transport: {:#}", e);
                self.retire(link_id, &key.remote);
                None
            }
        }
    }

    /// Forget `link_id` for good: later traffic for it is dropped until
    /// `remote` leaves.
    fn retire(&mut self, link_id: LinkId, remote: &ParticipantId) {
        self.orphans.remove(&link_id);
        self.retired.insert(link_id, remote.clone());
    }

    /// An offer we will not answer. Its candidates must not pile up.
    fn refuse_offer(&mut self, link_id: LinkId, from: &ParticipantId) {
        if !self.link_index.contains_key(&link_id) {
            self.retire(link_id, from);
        }
    }

    fn insert_link(&mut self, link: PeerLink) {
        self.link_index.insert(link.id(), link.key().clone());
        self.links.insert(link.key().clone(), link);
    }

    /// Close and forget the link under `key`. Returns `false` if there was none.
    fn remove_link(&mut self, key: &LinkKey, reason: &str) -> bool {
        let Some(mut link) = self.links.remove(key) else {
            return false;
        };
        let link_id = link.id();
        self.link_index.remove(&link_id);
        self.retire(link_id, &key.remote);
        link.close();
        info!(%key, link = %link_id, reason, "Link removed");

        if key.direction == LinkDirection::Pull {
            let _ = self.registry.send(RegistryEvent::StreamDetached {
                participant: key.remote.clone(),
                link: link_id,
            });
        }
        true
    }

    fn send(&self, to: ParticipantId, message: NegotiationMessage) {
        let kind = message.kind();
        if self.subscription.send(to.clone(), message) == 0 {
            debug!(%to, kind, "Signal not delivered");
        }
    }
}
