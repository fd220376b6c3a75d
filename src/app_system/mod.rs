//! System orchestration, startup, and shutdown logic.

pub mod system;
pub mod tracing;

pub use self::system::*;
pub use self::tracing::*;
