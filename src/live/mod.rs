//! The live channel: server-pushed events and the session/room registry.

pub mod events;
pub mod registry;

pub use events::ServerEvent;
pub use registry::{ConnectionId, Room, SessionRegistry};
