pub mod frontend;
pub mod backend;
pub mod logging;
pub mod error;
pub mod session;

// Re-export logging macros for convenience
pub use logging::*;
pub use error::CalcError;
pub use session::{Engine, Session};
