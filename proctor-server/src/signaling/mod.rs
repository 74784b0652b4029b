mod relay_state;
mod router;
mod ws_handler;

pub use relay_state::RelayState;
pub use router::relay_router;
pub use ws_handler::{ConnectParams, HealthReport};
