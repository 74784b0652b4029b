use proctor_core::{NegotiationMessage, RoomId};
use proctor_server::{RelayState, ServerConfig};
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::TestRelay;

#[tokio::test]
async fn test_socket_close_leaves_room() {
    init_tracing();

    let relay = TestRelay::start(RelayState::from_config(&ServerConfig::default()))
        .await
        .expect("Failed to start relay");
    let room = RoomId::from("exam1");

    let mut proctor = relay
        .connect("/ws/exam1/proctor-1?role=proctor")
        .await
        .expect("Proctor failed to connect");
    let candidate = relay
        .connect("/ws/exam1/cand-a?role=candidate")
        .await
        .expect("Candidate failed to connect");
    proctor.next_envelope(2000).await.expect("No join");

    candidate.close().await.expect("Close failed");

    let leave = proctor.next_envelope(2000).await.expect("No leave");
    assert_eq!(leave.from.as_str(), "cand-a");
    assert_eq!(leave.message, NegotiationMessage::Leave);

    let hub = &relay.state.hub;
    for _ in 0..100 {
        if hub.members(&room).len() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(hub.members(&room).len(), 1);
}
