mod signaling_output;
mod subscription;

pub use signaling_output::{Membership, SignalingOutput};
pub use subscription::{Publisher, Subscription};
