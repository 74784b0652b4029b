mod member;
mod signaling_hub;

pub use signaling_hub::SignalingHub;
