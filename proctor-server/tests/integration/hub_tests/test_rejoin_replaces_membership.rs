use proctor_core::{NegotiationMessage, ParticipantId, Role, RoomId};
use proctor_server::SignalingHub;

use crate::integration::init_tracing;
use crate::utils::{drain, kinds};

#[tokio::test]
async fn test_rejoin_replaces_membership() {
    init_tracing();

    let hub = SignalingHub::new();
    let room = RoomId::from("exam1");
    let mut proctor = hub.join(room.clone(), "proctor-1".into(), Role::Proctor);
    let mut first = hub.join(room.clone(), "cand-a".into(), Role::Candidate);
    drain(&mut proctor);
    drain(&mut first);

    let mut second = hub.join(room.clone(), "cand-a".into(), Role::Candidate);

    assert_eq!(
        kinds(&drain(&mut proctor)),
        vec![("cand-a".into(), "leave"), ("cand-a".into(), "join")],
        "Old membership leaves before the new one joins"
    );
    assert!(first.recv().await.is_none(), "Replaced inbox is closed");
    assert_eq!(hub.members(&room).len(), 2);

    // The stale handle can neither publish nor evict its replacement.
    assert_eq!(first.send(ParticipantId::from("proctor-1"), NegotiationMessage::Leave), 0);
    drop(first);
    assert!(hub.is_member(&room, &"cand-a".into()));

    assert_eq!(second.send(ParticipantId::from("proctor-1"), NegotiationMessage::Leave), 1);
    assert_eq!(drain(&mut second).len(), 1, "Replay of the proctor only");
}
