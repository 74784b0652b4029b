use proctor_client::{LinkDirection, LinkState};
use proctor_core::{IceCandidate, LinkId, NegotiationMessage, ParticipantId, Role, RoomId};
use proctor_server::SignalingHub;
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{
    ROOM, TestParticipant, TransportOp, WAIT_TIMEOUT_MS, eventually, has_link, recv_matching,
    wait_for_links,
};

fn offer(link: LinkId) -> NegotiationMessage {
    NegotiationMessage::Offer {
        link,
        source: "cand-a".into(),
        sdp: "v=0 offer".into(),
    }
}

#[tokio::test]
async fn test_new_offer_replaces_push_link() {
    init_tracing();

    let hub = SignalingHub::new();
    let cand_a = TestParticipant::join(&hub, "cand-a", Role::Candidate);
    let mut proctor = hub.join(RoomId::from(ROOM), "proctor-1".into(), Role::Proctor);
    let cand_a_id = ParticipantId::from("cand-a");

    let first = LinkId::new();
    proctor.send(cand_a_id.clone(), offer(first));
    recv_matching(&mut proctor, WAIT_TIMEOUT_MS, |e| {
        matches!(e.message, NegotiationMessage::Answer { link, .. } if link == first)
    })
    .await
    .expect("No answer for first offer");
    let old_transport = cand_a
        .transports
        .transport_for("proctor-1", LinkDirection::Push)
        .unwrap();

    let second = LinkId::new();
    proctor.send(cand_a_id.clone(), offer(second));
    recv_matching(&mut proctor, WAIT_TIMEOUT_MS, |e| {
        matches!(e.message, NegotiationMessage::Answer { link, .. } if link == second)
    })
    .await
    .expect("No answer for second offer");

    assert!(eventually(WAIT_TIMEOUT_MS, || old_transport.is_closed()).await);
    let links = wait_for_links(&cand_a.session, WAIT_TIMEOUT_MS, |l| {
        l.len() == 1 && has_link(l, "proctor-1", LinkDirection::Push, LinkState::Connected)
    })
    .await;
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].link, second);

    let new_transport = cand_a
        .transports
        .transport_for("proctor-1", LinkDirection::Push)
        .unwrap();

    // Late traffic for the replaced link reaches neither transport.
    proctor.send(cand_a_id.clone(), NegotiationMessage::IceCandidate {
        link: first,
        candidate: IceCandidate::new("late-1"),
    });
    proctor.send(cand_a_id.clone(), offer(first));
    assert!(
        recv_matching(&mut proctor, 200, |e| e.message.kind() == "answer")
            .await
            .is_none(),
        "Replaced link id must not be answered again"
    );
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(old_transport.ops().last(), Some(&TransportOp::Closed));
    assert!(old_transport.applied_candidates().is_empty());
    assert!(new_transport.applied_candidates().is_empty());
    assert_eq!(cand_a.transports.count_for("proctor-1", LinkDirection::Push), 2);

    let links = cand_a.session.links().await.unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].link, second);

    cand_a.session.leave().await;
}
