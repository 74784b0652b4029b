use crate::signaling::RelayState;
use crate::signaling::ws_handler::{health_handler, ice_servers_handler, ws_handler};
use axum::Router;
use axum::routing::get;

pub fn relay_router(state: RelayState) -> Router {
    Router::new()
        .route("/ws/{room}/{participant}", get(ws_handler))
        .route("/ice-servers", get(ice_servers_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}
