use proctor_client::{LinkDirection, LinkState};
use proctor_core::{ParticipantId, Role};
use proctor_server::SignalingHub;

use crate::integration::init_tracing;
use crate::utils::{TestParticipant, WAIT_TIMEOUT_MS, all_connected, eventually, has_link, wait_for_links};

#[tokio::test]
async fn test_transport_failure_is_isolated() {
    init_tracing();

    let hub = SignalingHub::new();
    let proctor = TestParticipant::join(&hub, "proctor-1", Role::Proctor);
    let cand_a = TestParticipant::join(&hub, "cand-a", Role::Candidate);
    let cand_b = TestParticipant::join(&hub, "cand-b", Role::Candidate);

    let links = wait_for_links(&proctor.session, WAIT_TIMEOUT_MS, |l| all_connected(l, 2)).await;
    assert!(all_connected(&links, 2));

    let registry = proctor.session.registry();
    assert!(eventually(WAIT_TIMEOUT_MS, || registry.streams().len() == 2).await);
    let b_stream = registry.stream(&"cand-b".into()).unwrap();

    proctor
        .transports
        .transport_for("cand-a", LinkDirection::Pull)
        .unwrap()
        .fail()
        .await;

    let links = wait_for_links(&proctor.session, WAIT_TIMEOUT_MS, |l| l.len() == 1).await;
    assert_eq!(links.len(), 1, "Failed link should be removed, got {:?}", links);
    assert!(has_link(&links, "cand-b", LinkDirection::Pull, LinkState::Connected));

    let cand_a_id = ParticipantId::from("cand-a");
    assert!(eventually(WAIT_TIMEOUT_MS, || registry.stream(&cand_a_id).is_none()).await);

    // cand-b's stream is the same one as before the failure.
    let still = registry.stream(&"cand-b".into()).unwrap();
    assert!(still.same_stream(&b_stream));
    assert!(still.is_live());

    // No automatic retry.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert_eq!(proctor.transports.count_for("cand-a", LinkDirection::Pull), 1);

    for p in [proctor, cand_a, cand_b] {
        p.session.leave().await;
    }
}
