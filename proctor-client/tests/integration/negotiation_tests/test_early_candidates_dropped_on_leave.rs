use proctor_client::LinkDirection;
use proctor_core::{IceCandidate, LinkId, NegotiationMessage, ParticipantId, Role, RoomId};
use proctor_server::SignalingHub;
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{ROOM, TestParticipant, TransportOp, WAIT_TIMEOUT_MS, recv_matching};

#[tokio::test]
async fn test_early_candidates_dropped_on_leave() {
    init_tracing();

    let hub = SignalingHub::new();
    let cand_a = TestParticipant::join(&hub, "cand-a", Role::Candidate);
    let cand_a_id = ParticipantId::from("cand-a");
    let link = LinkId::new();

    let mut proctor = hub.join(RoomId::from(ROOM), "proctor-1".into(), Role::Proctor);
    proctor.send(cand_a_id.clone(), NegotiationMessage::IceCandidate {
        link,
        candidate: IceCandidate::new("stale-1"),
    });
    proctor.leave();
    drop(proctor);
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Same link id from the rejoined proctor starts clean.
    let mut proctor = hub.join(RoomId::from(ROOM), "proctor-1".into(), Role::Proctor);
    proctor.send(cand_a_id, NegotiationMessage::Offer {
        link,
        source: "cand-a".into(),
        sdp: "v=0 offer".into(),
    });
    recv_matching(&mut proctor, WAIT_TIMEOUT_MS, |e| e.message.kind() == "answer")
        .await
        .expect("No answer after rejoin");

    let transport = cand_a
        .transports
        .transport_for("proctor-1", LinkDirection::Push)
        .unwrap();
    assert_eq!(transport.ops(), vec![TransportOp::RemoteOffer, TransportOp::LocalAnswer]);
    assert!(transport.applied_candidates().is_empty());

    cand_a.session.leave().await;
}
