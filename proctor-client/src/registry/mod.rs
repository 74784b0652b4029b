mod registry_event;
mod stream_registry;

pub use registry_event::*;
pub use stream_registry::*;
