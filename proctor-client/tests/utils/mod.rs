pub mod test_participant;

pub use mock_transport::*;
pub use test_participant::*;
pub use wait_helpers::*;
