use proctor_core::{NegotiationMessage, Recipient, Role, RoomId};
use proctor_server::SignalingHub;

use crate::integration::init_tracing;
use crate::utils::drain;

#[tokio::test]
async fn test_rooms_are_isolated() {
    init_tracing();

    let hub = SignalingHub::new();
    let exam1 = RoomId::from("exam1");
    let exam2 = RoomId::from("exam2");

    let mut p1 = hub.join(exam1.clone(), "proctor-1".into(), Role::Proctor);
    let mut p2 = hub.join(exam2.clone(), "proctor-1".into(), Role::Proctor);
    let _cand = hub.join(exam1.clone(), "cand-a".into(), Role::Candidate);

    assert_eq!(drain(&mut p1).len(), 1);
    assert!(drain(&mut p2).is_empty(), "Joins do not cross rooms");

    drop(p1);
    assert_eq!(p2.send(Recipient::All, NegotiationMessage::Leave), 0);
    assert_eq!(hub.rooms(), vec![exam1.clone(), exam2.clone()]);
    assert!(hub.is_member(&exam2, &"proctor-1".into()));
    assert!(!hub.is_member(&exam1, &"proctor-1".into()));
}
