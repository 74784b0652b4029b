mod capture_backend;
mod capture_manager;
mod synthetic;

pub use capture_backend::*;
pub use capture_manager::*;
pub use synthetic::*;
