pub mod model;
pub mod signaling;
pub mod utils;

pub use model::*;
pub use signaling::{Membership, Publisher, SignalingOutput, Subscription};
