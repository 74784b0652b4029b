use proctor_client::{LinkDirection, LinkState, OrchestratorConfig};
use proctor_core::{ParticipantId, Role};
use proctor_server::SignalingHub;
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{TestParticipant, WAIT_TIMEOUT_MS, all_connected, eventually, has_link, wait_for_links};

#[tokio::test]
async fn test_proctor_camera_reaches_candidate() {
    init_tracing();

    let hub = SignalingHub::new();
    let proctor = TestParticipant::join_with(
        &hub,
        "proctor-1",
        Role::Proctor,
        OrchestratorConfig {
            push_camera: true,
            ..Default::default()
        },
        None,
    );
    let cand_a = TestParticipant::join_with(
        &hub,
        "cand-a",
        Role::Candidate,
        OrchestratorConfig {
            accept_proctor_feed: true,
            ..Default::default()
        },
        None,
    );

    let links = wait_for_links(&cand_a.session, WAIT_TIMEOUT_MS, |l| all_connected(l, 2)).await;
    assert!(has_link(&links, "proctor-1", LinkDirection::Pull, LinkState::Connected));
    assert!(has_link(&links, "proctor-1", LinkDirection::Push, LinkState::Connected));

    let links = wait_for_links(&proctor.session, WAIT_TIMEOUT_MS, |l| all_connected(l, 2)).await;
    assert!(has_link(&links, "cand-a", LinkDirection::Pull, LinkState::Connected));
    assert!(has_link(&links, "cand-a", LinkDirection::Push, LinkState::Connected));

    let proctor_id = ParticipantId::from("proctor-1");
    let registry = cand_a.session.registry();
    assert!(eventually(WAIT_TIMEOUT_MS, || registry.stream(&proctor_id).is_some()).await);

    proctor.session.leave().await;
    cand_a.session.leave().await;
}

#[tokio::test]
async fn test_proctor_camera_stays_private_by_default() {
    init_tracing();

    let hub = SignalingHub::new();
    let proctor = TestParticipant::join(&hub, "proctor-1", Role::Proctor);
    let cand_a = TestParticipant::join_with(
        &hub,
        "cand-a",
        Role::Candidate,
        OrchestratorConfig {
            accept_proctor_feed: true,
            ..Default::default()
        },
        None,
    );

    wait_for_links(&proctor.session, WAIT_TIMEOUT_MS, |l| all_connected(l, 1)).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    // The candidate asked, the proctor never answered.
    let links = cand_a.session.links().await.unwrap();
    assert!(has_link(&links, "proctor-1", LinkDirection::Pull, LinkState::OfferSent));
    assert!(cand_a.session.registry().stream(&"proctor-1".into()).is_none());

    let links = proctor.session.links().await.unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].direction, LinkDirection::Pull);

    proctor.session.leave().await;
    cand_a.session.leave().await;
}
