use proctor_core::{NegotiationMessage, Role, RoomId};
use proctor_server::SignalingHub;

use crate::integration::init_tracing;
use crate::utils::{drain, kinds};

#[tokio::test]
async fn test_late_joiner_gets_presence_replay() {
    init_tracing();

    let hub = SignalingHub::new();
    let room = RoomId::from("exam1");

    let mut proctor = hub.join(room.clone(), "proctor-1".into(), Role::Proctor);
    let mut cand_a = hub.join(room.clone(), "cand-a".into(), Role::Candidate);
    let mut cand_b = hub.join(room.clone(), "cand-b".into(), Role::Candidate);

    assert_eq!(
        kinds(&drain(&mut proctor)),
        vec![("cand-a".into(), "join"), ("cand-b".into(), "join")]
    );
    assert_eq!(
        kinds(&drain(&mut cand_a)),
        vec![("proctor-1".into(), "join"), ("cand-b".into(), "join")]
    );

    let replay = drain(&mut cand_b);
    assert_eq!(replay.len(), 2, "One replayed Join per existing member");
    let proctor_join = replay
        .iter()
        .find(|e| e.from.as_str() == "proctor-1")
        .expect("proctor presence replayed");
    assert_eq!(
        proctor_join.message,
        NegotiationMessage::Join {
            role: Role::Proctor
        }
    );
    assert!(replay.iter().all(|e| e.from.as_str() != "cand-b"));

    let members = hub.members(&room);
    assert_eq!(members.len(), 3);
}
