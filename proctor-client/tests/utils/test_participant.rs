use proctor_client::{
    CaptureConstraints, CaptureManager, OrchestratorConfig, ParticipantSession, SyntheticBackend,
    TransportFactory,
};
use proctor_core::{Role, RoomId};
use proctor_server::SignalingHub;
use std::sync::Arc;

use super::mock_transport::MockTransportFactory;

pub const ROOM: &str = "exam1";

/// A session on mock transports, with the factory kept for inspection.
pub struct TestParticipant {
    pub session: ParticipantSession,
    pub transports: Arc<MockTransportFactory>,
}

impl TestParticipant {
    pub fn join(hub: &SignalingHub, id: &str, role: Role) -> Self {
        Self::join_with(hub, id, role, OrchestratorConfig::default(), None)
    }

    pub fn join_with(
        hub: &SignalingHub,
        id: &str,
        role: Role,
        config: OrchestratorConfig,
        capture: Option<CaptureManager>,
    ) -> Self {
        let transports = MockTransportFactory::new(id);
        let subscription = hub.join(RoomId::from(ROOM), id.into(), role);
        let session = ParticipantSession::start(
            subscription,
            config,
            transports.clone() as Arc<dyn TransportFactory>,
            capture,
        );
        Self {
            session,
            transports,
        }
    }
}

/// Capture started on the synthetic backend.
pub async fn synthetic_capture(owner: &str, backend: &SyntheticBackend) -> CaptureManager {
    let mut capture = CaptureManager::new(
        owner.into(),
        Arc::new(backend.clone()),
        CaptureConstraints::default(),
    );
    capture.start().await.expect("Synthetic capture failed");
    capture
}
