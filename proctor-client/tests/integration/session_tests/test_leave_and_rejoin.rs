use proctor_client::{LinkDirection, LinkState};
use proctor_core::{ParticipantId, Role};
use proctor_server::SignalingHub;

use crate::integration::init_tracing;
use crate::utils::{TestParticipant, WAIT_TIMEOUT_MS, all_connected, eventually, has_link, wait_for_links};

#[tokio::test]
async fn test_leave_and_rejoin() {
    init_tracing();

    let hub = SignalingHub::new();
    let proctor = TestParticipant::join(&hub, "proctor-1", Role::Proctor);
    let cand_a = TestParticipant::join(&hub, "cand-a", Role::Candidate);

    let links = wait_for_links(&proctor.session, WAIT_TIMEOUT_MS, |l| all_connected(l, 1)).await;
    let first_link = links[0].link;

    cand_a.session.leave().await;
    let cand_a = TestParticipant::join(&hub, "cand-a", Role::Candidate);

    let links = wait_for_links(&proctor.session, WAIT_TIMEOUT_MS, |l| {
        all_connected(l, 1) && l[0].link != first_link
    })
    .await;
    assert_eq!(links.len(), 1, "Exactly one link to cand-a, got {:?}", links);
    assert!(has_link(&links, "cand-a", LinkDirection::Pull, LinkState::Connected));
    assert_ne!(links[0].link, first_link);

    let first_transport = proctor
        .transports
        .transports()
        .into_iter()
        .find(|t| t.link == first_link)
        .unwrap();
    assert!(eventually(WAIT_TIMEOUT_MS, || first_transport.is_closed()).await);

    let cand_a_id = ParticipantId::from("cand-a");
    let registry = proctor.session.registry();
    assert!(eventually(WAIT_TIMEOUT_MS, || registry.stream(&cand_a_id).is_some()).await);
    assert_eq!(registry.participant_ids(), vec![cand_a_id]);

    proctor.session.leave().await;
    cand_a.session.leave().await;
}
