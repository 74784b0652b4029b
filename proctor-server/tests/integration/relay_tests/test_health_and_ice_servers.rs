use proctor_core::{IceServerConfig, Role};
use proctor_server::{HealthReport, RelayState, ServerConfig};

use crate::integration::init_tracing;
use crate::utils::TestRelay;

#[tokio::test]
async fn test_health_and_ice_servers() {
    init_tracing();

    let config = ServerConfig {
        ice_servers: vec![IceServerConfig::stun("stun:stun.example.org:3478")],
        ..ServerConfig::default()
    };
    let relay = TestRelay::start(RelayState::from_config(&config))
        .await
        .expect("Failed to start relay");

    let servers: Vec<IceServerConfig> = relay.get_json("/ice-servers").await.expect("GET failed");
    assert_eq!(servers, config.ice_servers);

    let _sub = relay
        .state
        .hub
        .join("exam1".into(), "proctor-1".into(), Role::Proctor);

    let report: HealthReport = relay.get_json("/health").await.expect("GET failed");
    assert_eq!(report, HealthReport { rooms: 1, members: 1 });

    let response = relay.get("/health").await.expect("GET failed");
    assert_eq!(
        response.headers().get(reqwest::header::CONTENT_TYPE).unwrap(),
        "application/json"
    );

    let missing = relay.get("/nowhere").await.unwrap_err();
    let status = missing
        .downcast_ref::<reqwest::Error>()
        .and_then(reqwest::Error::status);
    assert_eq!(status, Some(reqwest::StatusCode::NOT_FOUND));
}
