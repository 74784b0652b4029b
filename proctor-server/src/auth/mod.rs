mod authenticator;

pub use authenticator::*;
