//! # Classline Chat Core
//!
//! The real-time chat and contact-resolution core of a school management
//! backend: who may message whom, the contact list with unread counts, and a
//! websocket live channel kept consistent with the REST history view.
//!
//! ## Overview
//!
//! - **Role-scoped permissions**: admins reach everyone, everyone reaches
//!   admins, teachers and students reach each other only through a shared
//!   class assignment.
//! - **Contact resolution**: the permitted counterpart set enriched with last
//!   message and unread count, sorted by recency.
//! - **Live channel**: authenticated websocket sessions joined to per-user,
//!   per-class, and per-grade rooms for message delivery, typing signals,
//!   read receipts, and presence.
//! - **Dual path**: the REST endpoints and the live channel share one
//!   permission resolver and one contact resolver, so the two surfaces can
//!   never disagree.
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── cache.rs          # TTL read-through user snapshot cache
//! ├── config/           # Env-driven configuration (JWT, CORS, chat tunables)
//! ├── live/             # Server events + session/room registry
//! ├── middleware/       # Bearer auth extractor
//! ├── modules/chat/     # Permissions, contacts, service, REST + websocket
//! ├── store/            # Directory/Message store contracts, Postgres + fakes
//! └── utils/            # Errors, JWT, pagination
//! ```
//!
//! The user directory, teacher/student profiles, and class assignments are
//! owned by collaborator subsystems; this core reads them through the
//! [`store::DirectoryStore`] contract and owns nothing but messages.
//!
//! ## Live protocol
//!
//! Clients connect to `/ws` with a bearer token (query `token` or
//! `Authorization` header). Client frames carry an optional correlation `id`
//! which the server echoes in its ack. Server pushes are
//! `{"event": name, "data": payload}` with the event names fixed by the
//! client contract (`new_message`, `user_typing`, `user_online`, ...).

pub mod cache;
pub mod config;
pub mod docs;
pub mod live;
pub mod logging;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod store;
pub mod utils;
