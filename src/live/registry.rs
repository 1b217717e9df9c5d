//! In-process registry of live connections and the rooms they joined.
//!
//! Process-scoped state, constructed once at startup and injected through
//! `AppState`. A session is only ever mutated by its own connection's
//! lifecycle (connect, room joins, disconnect); a multi-instance deployment
//! would need an external session layer instead of this map.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;
use uuid::Uuid;

use crate::live::events::ServerEvent;

/// Logical broadcast group: a user's personal inbox, a class, or a grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    User(Uuid),
    Class(Uuid),
    Grade(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

struct Session {
    user_id: Uuid,
    tx: UnboundedSender<ServerEvent>,
    rooms: HashSet<Room>,
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<ConnectionId, Session>,
    rooms: HashMap<Room, HashSet<ConnectionId>>,
}

#[derive(Default)]
pub struct SessionRegistry {
    next_id: AtomicU64,
    inner: RwLock<Inner>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an authenticated connection and joins its personal room.
    pub async fn connect(
        &self,
        user_id: Uuid,
        tx: UnboundedSender<ServerEvent>,
    ) -> ConnectionId {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut inner = self.inner.write().await;
        let room = Room::User(user_id);
        inner.sessions.insert(
            id,
            Session {
                user_id,
                tx,
                rooms: HashSet::from([room]),
            },
        );
        inner.rooms.entry(room).or_default().insert(id);
        debug!(user_id = %user_id, connection = id.0, "live session connected");
        id
    }

    pub async fn join(&self, connection: ConnectionId, room: Room) {
        let mut inner = self.inner.write().await;
        let inner = &mut *inner;
        if let Some(session) = inner.sessions.get_mut(&connection) {
            session.rooms.insert(room);
            inner.rooms.entry(room).or_default().insert(connection);
        }
    }

    /// Removes the session from every room it joined. Safe to call twice.
    pub async fn disconnect(&self, connection: ConnectionId) {
        let mut inner = self.inner.write().await;
        if let Some(session) = inner.sessions.remove(&connection) {
            for room in session.rooms {
                if let Some(members) = inner.rooms.get_mut(&room) {
                    members.remove(&connection);
                    if members.is_empty() {
                        inner.rooms.remove(&room);
                    }
                }
            }
            debug!(user_id = %session.user_id, connection = connection.0, "live session disconnected");
        }
    }

    /// Delivers the event once to every session in the room.
    pub async fn publish(&self, room: Room, event: ServerEvent) {
        self.publish_except(room, None, event).await
    }

    /// Delivers to every session in the room except the originating one, for
    /// "the sender's other sessions" fan-out.
    pub async fn publish_except(
        &self,
        room: Room,
        except: Option<ConnectionId>,
        event: ServerEvent,
    ) {
        let inner = self.inner.read().await;
        let Some(members) = inner.rooms.get(&room) else {
            return;
        };
        for connection in members {
            if Some(*connection) == except {
                continue;
            }
            if let Some(session) = inner.sessions.get(connection) {
                // A closed receiver just means the connection is tearing down.
                let _ = session.tx.send(event.clone());
            }
        }
    }

    /// Presence fan-out: every connected session except the originating one.
    pub async fn broadcast_except(&self, except: ConnectionId, event: ServerEvent) {
        let inner = self.inner.read().await;
        for (connection, session) in &inner.sessions {
            if *connection == except {
                continue;
            }
            let _ = session.tx.send(event.clone());
        }
    }

    pub async fn session_count(&self) -> usize {
        self.inner.read().await.sessions.len()
    }
}
