pub use proctor_core::{LinkId, ParticipantId, Role, RoomId, SignalEnvelope, Subscription};

pub mod model {
    pub use proctor_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use proctor_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use proctor_client::*;
}
