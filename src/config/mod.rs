//! Configuration modules, loaded from environment variables.
//!
//! - [`chat`]: chat-core tunables (cache TTL, handshake timeout, page sizes)
//! - [`cors`]: allowed origins
//! - [`database`]: PostgreSQL connection pool
//! - [`jwt`]: bearer token verification

pub mod chat;
pub mod cors;
pub mod database;
pub mod jwt;
