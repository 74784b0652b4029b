mod capture;
mod error;
mod media;
mod orchestrator;
mod registry;
mod session;
mod transport;

pub use capture::*;
pub use error::*;
pub use media::*;
pub use orchestrator::*;
pub use registry::*;
pub use session::*;
pub use transport::*;
