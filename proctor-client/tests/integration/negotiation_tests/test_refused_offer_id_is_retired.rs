use proctor_core::{IceCandidate, LinkId, NegotiationMessage, ParticipantId, Role, RoomId};
use proctor_server::SignalingHub;
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{ROOM, TestParticipant, recv_matching};

#[tokio::test]
async fn test_refused_offer_id_is_retired() {
    init_tracing();

    let hub = SignalingHub::new();
    let cand_a = TestParticipant::join(&hub, "cand-a", Role::Candidate);
    let mut proctor = hub.join(RoomId::from(ROOM), "proctor-1".into(), Role::Proctor);
    let cand_a_id = ParticipantId::from("cand-a");
    let link = LinkId::new();

    // Offer naming a capture cand-a does not own.
    proctor.send(cand_a_id.clone(), NegotiationMessage::Offer {
        link,
        source: "cand-x".into(),
        sdp: "v=0 offer".into(),
    });
    for i in 0..5 {
        proctor.send(cand_a_id.clone(), NegotiationMessage::IceCandidate {
            link,
            candidate: IceCandidate::new(format!("late-{i}")),
        });
    }
    // The refused id stays refused.
    proctor.send(cand_a_id, NegotiationMessage::Offer {
        link,
        source: "cand-a".into(),
        sdp: "v=0 offer".into(),
    });

    assert!(
        recv_matching(&mut proctor, 200, |e| e.message.kind() == "answer")
            .await
            .is_none()
    );
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(cand_a.transports.transports().is_empty());
    assert!(cand_a.session.links().await.unwrap().is_empty());

    cand_a.session.leave().await;
}
