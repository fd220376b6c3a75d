//! Board state: status store, lane projection and the owning actor.

pub mod actor;
pub mod projection;
pub mod status_store;

pub use actor::*;
pub use projection::*;
pub use status_store::*;
