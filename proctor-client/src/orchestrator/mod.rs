mod link_state;
mod orchestrator;
mod orchestrator_command;
mod orchestrator_config;
mod peer_link;

pub use link_state::*;
pub use orchestrator::*;
pub use orchestrator_command::*;
pub use orchestrator_config::*;
pub use peer_link::*;
