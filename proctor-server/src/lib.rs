mod auth;
mod config;
mod error;
mod hub;
mod signaling;

pub use auth::*;
pub use config::*;
pub use error::*;
pub use hub::*;
pub use signaling::*;
