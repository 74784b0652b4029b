use crate::auth::{Identity, IdentityClaim};
use crate::signaling::RelayState;
use axum::Json;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use proctor_core::{IceServerConfig, NegotiationMessage, Recipient, Role};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    pub role: Role,
    #[serde(default)]
    pub token: Option<String>,
}

/// Inbound frame. Clients may send a whole envelope; only the addressee and
/// the message are trusted.
#[derive(Debug, Deserialize)]
struct InboundSignal {
    to: Recipient,
    message: NegotiationMessage,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthReport {
    pub rooms: usize,
    pub members: usize,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path((room, participant)): Path<(String, String)>,
    Query(params): Query<ConnectParams>,
    State(state): State<RelayState>,
) -> Response {
    let claim = IdentityClaim {
        room: room.into(),
        participant: participant.into(),
        role: params.role,
        token: params.token,
    };

    match state.authenticator.authenticate(claim).await {
        Ok(identity) => ws
            .on_upgrade(move |socket| handle_socket(socket, identity, state))
            .into_response(),
        Err(e) => {
            warn!("Rejecting connection: {}", e);
            (StatusCode::UNAUTHORIZED, e.to_string()).into_response()
        }
    }
}

pub async fn ice_servers_handler(State(state): State<RelayState>) -> Json<Vec<IceServerConfig>> {
    Json(state.get_ice_servers())
}

pub async fn health_handler(State(state): State<RelayState>) -> Json<HealthReport> {
    Json(HealthReport {
        rooms: state.hub.rooms().len(),
        members: state.hub.member_count(),
    })
}

async fn handle_socket(socket: WebSocket, identity: Identity, state: RelayState) {
    let Identity {
        room,
        participant,
        role,
    } = identity;
    info!(%room, %participant, %role, "New WebSocket connection");

    let (mut sender, mut receiver) = socket.split();
    let mut subscription = state.hub.join(room.clone(), participant.clone(), role);
    let publisher = subscription.publisher();

    // Owns the subscription: aborting this task leaves the room.
    let mut send_task = tokio::spawn(async move {
        while let Some(envelope) = subscription.recv().await {
            let json = match serde_json::to_string(&envelope) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize envelope: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let participant = participant.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => {
                        match serde_json::from_str::<InboundSignal>(text.as_str()) {
                            Ok(InboundSignal {
                                message: NegotiationMessage::Leave,
                                ..
                            }) => break,
                            Ok(InboundSignal {
                                message: NegotiationMessage::Join { .. },
                                ..
                            }) => {
                                // membership is announced by the hub on connect
                            }
                            Ok(InboundSignal { to, message }) => {
                                publisher.send(to, message);
                            }
                            Err(e) => {
                                warn!("Invalid envelope from {}: {}", participant, e)
                            }
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    info!(%room, %participant, "WebSocket disconnected");
}
