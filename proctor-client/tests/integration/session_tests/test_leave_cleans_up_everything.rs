use proctor_client::{OrchestratorConfig, SyntheticBackend};
use proctor_core::{ParticipantId, Role, RoomId};
use proctor_server::SignalingHub;

use crate::integration::init_tracing;
use crate::utils::{
    ROOM, TestParticipant, WAIT_TIMEOUT_MS, all_connected, eventually, synthetic_capture, wait_for_links,
};

#[tokio::test]
async fn test_leave_cleans_up_everything() {
    init_tracing();

    let hub = SignalingHub::new();
    let room = RoomId::from(ROOM);
    let proctor = TestParticipant::join(&hub, "proctor-1", Role::Proctor);

    let camera = SyntheticBackend::new();
    let capture = synthetic_capture("cand-a", &camera).await;
    let cand_a = TestParticipant::join_with(
        &hub,
        "cand-a",
        Role::Candidate,
        OrchestratorConfig::default(),
        Some(capture),
    );
    let cand_b = TestParticipant::join(&hub, "cand-b", Role::Candidate);

    wait_for_links(&proctor.session, WAIT_TIMEOUT_MS, |l| all_connected(l, 2)).await;
    assert_eq!(camera.active(), 2);
    assert!(cand_a.session.registry().local_stream().is_some());

    // Proctor leaves: its transports close, candidates drop their links to it.
    let proctor_transports = proctor.transports.clone();
    proctor.session.leave().await;

    assert!(!hub.is_member(&room, &"proctor-1".into()));
    assert!(
        eventually(WAIT_TIMEOUT_MS, || proctor_transports
            .transports()
            .iter()
            .all(|t| t.is_closed()))
        .await
    );

    let links = wait_for_links(&cand_a.session, WAIT_TIMEOUT_MS, |l| l.is_empty()).await;
    assert!(links.is_empty(), "cand-a kept {:?}", links);
    let links = wait_for_links(&cand_b.session, WAIT_TIMEOUT_MS, |l| l.is_empty()).await;
    assert!(links.is_empty());
    assert!(
        eventually(WAIT_TIMEOUT_MS, || !cand_a
            .session
            .registry()
            .participant_ids()
            .contains(&ParticipantId::from("proctor-1")))
        .await
    );

    // The candidate keeps its camera until it leaves itself.
    assert_eq!(camera.active(), 2);

    let registry = cand_a.session.registry().clone();
    cand_a.session.leave().await;
    assert!(eventually(WAIT_TIMEOUT_MS, || camera.active() == 0).await);
    assert!(registry.local_stream().is_none());
    assert!(registry.participants().is_empty());

    cand_b.session.leave().await;
    assert!(hub.rooms().is_empty(), "Empty room should be collected");
}
