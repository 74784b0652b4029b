
pub use inbox_helpers::*;
pub use test_relay::*;
