use crate::capture::CaptureManager;
use crate::error::{CaptureError, SessionError};
use crate::orchestrator::{
    LinkDirection, LinkSnapshot, Orchestrator, OrchestratorConfig, OrchestratorHandle,
};
use crate::registry::StreamRegistry;
use crate::transport::TransportFactory;
use proctor_core::{ParticipantId, Role, RoomId, Subscription};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// One participant in one room: signaling, links, registry and capture wired together.
pub struct ParticipantSession {
    room: RoomId,
    participant: ParticipantId,
    role: Role,
    registry: StreamRegistry,
    orchestrator: OrchestratorHandle,
    capture: Option<CaptureManager>,
    orchestrator_task: JoinHandle<()>,
    registry_task: JoinHandle<()>,
}

impl ParticipantSession {
    /// `capture` should already be started if the participant publishes media.
    pub fn start(
        subscription: Subscription,
        config: OrchestratorConfig,
        transports: Arc<dyn TransportFactory>,
        capture: Option<CaptureManager>,
    ) -> Self {
        let room = subscription.room().clone();
        let participant = subscription.participant().clone();
        let role = subscription.role();

        let registry = StreamRegistry::new();
        let local_media = capture.as_ref().and_then(CaptureManager::local_media);
        if let Some(media) = &local_media {
            registry.set_local_stream(Some(media.view.clone()));
        }

        let (registry_tx, registry_rx) = mpsc::unbounded_channel();
        let registry_task = tokio::spawn(registry.clone().run(registry_rx));

        let (orchestrator, handle) =
            Orchestrator::new(subscription, config, transports, local_media, registry_tx);
        let orchestrator_task = tokio::spawn(orchestrator.run());

        info!(%room, %participant, %role, "Session started");

        Self {
            room,
            participant,
            role,
            registry,
            orchestrator: handle,
            capture,
            orchestrator_task,
            registry_task,
        }
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.participant
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn registry(&self) -> &StreamRegistry {
        &self.registry
    }

    pub fn orchestrator(&self) -> &OrchestratorHandle {
        &self.orchestrator
    }

    pub async fn links(&self) -> Result<Vec<LinkSnapshot>, SessionError> {
        self.orchestrator.links().await
    }

    pub async fn close_link(
        &self,
        remote: ParticipantId,
        direction: LinkDirection,
    ) -> Result<bool, SessionError> {
        self.orchestrator.close_link(remote, direction).await
    }

    pub fn set_audio_enabled(&self, enabled: bool) -> Result<(), CaptureError> {
        self.capture
            .as_ref()
            .ok_or(CaptureError::NotStarted)?
            .set_audio_enabled(enabled)
    }

    pub fn set_video_enabled(&self, enabled: bool) -> Result<(), CaptureError> {
        self.capture
            .as_ref()
            .ok_or(CaptureError::NotStarted)?
            .set_video_enabled(enabled)
    }

    /// Leave the room, close every link and release the capture devices.
    pub async fn leave(mut self) {
        if let Err(e) = self.orchestrator.leave().await {
            warn!(participant = %self.participant, "Orchestrator already stopped: {}", e);
        }

        if let Some(mut capture) = self.capture.take() {
            capture.stop();
        }
        self.registry.set_local_stream(None);

        let _ = (&mut self.orchestrator_task).await;
        let _ = (&mut self.registry_task).await;
        info!(room = %self.room, participant = %self.participant, "Session ended");
    }
}
