//! The chat feature: contact resolution, permissions, message history, and
//! the live channel.

pub mod contacts;
pub mod controller;
pub mod model;
pub mod permissions;
pub mod router;
pub mod service;
pub mod socket;
