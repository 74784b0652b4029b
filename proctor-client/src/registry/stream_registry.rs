use crate::media::StreamView;
use crate::registry::registry_event::{RegistryChange, RegistryEvent};
use dashmap::DashMap;
use proctor_core::{LinkId, Participant, ParticipantId};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

const CHANGE_CAPACITY: usize = 64;

#[derive(Clone)]
struct AttachedStream {
    link: Option<LinkId>,
    view: StreamView,
}

struct RegistryInner {
    streams: DashMap<ParticipantId, AttachedStream>,
    participants: DashMap<ParticipantId, Participant>,
    local: RwLock<Option<StreamView>>,
    changes: broadcast::Sender<RegistryChange>,
}

/// Live participants of the room and the stream each one exposes to us.
#[derive(Clone)]
pub struct StreamRegistry {
    inner: Arc<RegistryInner>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            inner: Arc::new(RegistryInner {
                streams: DashMap::new(),
                participants: DashMap::new(),
                local: RwLock::new(None),
                changes,
            }),
        }
    }

    /// Record `stream` as the current stream of `participant`, replacing any
    /// previous one.
    pub fn attach(&self, participant: ParticipantId, stream: StreamView) {
        self.insert(participant, None, stream);
    }

    /// Returns `false` if nothing was attached.
    pub fn detach(&self, participant: &ParticipantId) -> bool {
        if self.inner.streams.remove(participant).is_none() {
            return false;
        }
        info!(%participant, "Stream detached");
        self.notify(RegistryChange::StreamDetached(participant.clone()));
        true
    }

    pub fn stream(&self, participant: &ParticipantId) -> Option<StreamView> {
        self.inner.streams.get(participant).map(|s| s.view.clone())
    }

    /// Attached remote streams ordered by participant id.
    pub fn streams(&self) -> Vec<(ParticipantId, StreamView)> {
        let mut streams: Vec<_> = self
            .inner
            .streams
            .iter()
            .map(|s| (s.key().clone(), s.value().view.clone()))
            .collect();
        streams.sort_by(|a, b| a.0.cmp(&b.0));
        streams
    }

    /// Remote participants ordered by join time.
    pub fn participants(&self) -> Vec<Participant> {
        let mut participants: Vec<_> = self
            .inner
            .participants
            .iter()
            .map(|p| p.value().clone())
            .collect();
        participants.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then_with(|| a.id.cmp(&b.id)));
        participants
    }

    pub fn participant_ids(&self) -> Vec<ParticipantId> {
        self.participants().into_iter().map(|p| p.id).collect()
    }

    pub fn local_stream(&self) -> Option<StreamView> {
        self.inner
            .local
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_local_stream(&self, stream: Option<StreamView>) {
        *self.inner.local.write().unwrap_or_else(PoisonError::into_inner) = stream;
        self.notify(RegistryChange::LocalStreamChanged);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryChange> {
        self.inner.changes.subscribe()
    }

    pub fn apply(&self, event: RegistryEvent) {
        match event {
            RegistryEvent::ParticipantJoined(participant) => {
                let id = participant.id.clone();
                self.inner.participants.insert(id.clone(), participant);
                self.notify(RegistryChange::ParticipantJoined(id));
            }
            RegistryEvent::ParticipantLeft(participant) => {
                self.detach(&participant);
                if self.inner.participants.remove(&participant).is_some() {
                    self.notify(RegistryChange::ParticipantLeft(participant));
                }
            }
            RegistryEvent::StreamAttached {
                participant,
                link,
                stream,
            } => self.insert(participant, Some(link), stream),
            RegistryEvent::StreamDetached { participant, link } => {
                let removed = self
                    .inner
                    .streams
                    .remove_if(&participant, |_, s| s.link.is_none_or(|l| l == link));
                match removed {
                    Some(_) => {
                        info!(%participant, %link, "Stream detached");
                        self.notify(RegistryChange::StreamDetached(participant));
                    }
                    None => debug!(%participant, %link, "Stale detach ignored"),
                }
            }
            RegistryEvent::Cleared => {
                self.inner.streams.clear();
                self.inner.participants.clear();
                self.notify(RegistryChange::Cleared);
            }
        }
    }

    /// Apply events until the orchestrator hangs up.
    pub async fn run(self, mut events: mpsc::UnboundedReceiver<RegistryEvent>) {
        while let Some(event) = events.recv().await {
            self.apply(event);
        }
        debug!("Registry event channel closed");
    }

    fn insert(&self, participant: ParticipantId, link: Option<LinkId>, view: StreamView) {
        info!(%participant, stream = %view.id(), "Stream attached");
        self.inner
            .streams
            .insert(participant.clone(), AttachedStream { link, view });
        self.notify(RegistryChange::StreamAttached(participant));
    }

    fn notify(&self, change: RegistryChange) {
        // No observers is fine.
        let _ = self.inner.changes.send(change);
    }
}

impl Default for StreamRegistry {
    fn default() -> Self {
        Self::new()
    }
}
