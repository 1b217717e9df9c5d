//! Server-to-client events.
//!
//! Frames serialize as `{"event": "<name>", "data": {...}}`. Event names and
//! payload field names are part of the client contract and must not change.

use serde::Serialize;
use uuid::Uuid;

use crate::modules::chat::model::{Message, UserSummary};

/// A `new_message` payload: the persisted message plus the sender summary so
/// clients can render without a directory round trip.
#[derive(Debug, Clone, Serialize)]
pub struct NewMessagePayload {
    pub message: Message,
    pub sender: UserSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEventPayload {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    NewMessage(NewMessagePayload),
    UserTyping(UserEventPayload),
    UserStopTyping(UserEventPayload),
    UserOnline(UserEventPayload),
    UserOffline(UserEventPayload),
    /// Emitted to the original sender when the recipient marks their messages
    /// read; `userId` is the reader.
    MessagesRead(UserEventPayload),
    // Class/grade broadcasts published by collaborator subsystems through the
    // same room model; payload shape is theirs.
    ScheduleUpdate(serde_json::Value),
    NewCourse(serde_json::Value),
    NewMaterial(serde_json::Value),
    NewExam(serde_json::Value),
}

impl ServerEvent {
    pub fn user_typing(user_id: Uuid) -> Self {
        Self::UserTyping(UserEventPayload { user_id })
    }

    pub fn user_stop_typing(user_id: Uuid) -> Self {
        Self::UserStopTyping(UserEventPayload { user_id })
    }

    pub fn user_online(user_id: Uuid) -> Self {
        Self::UserOnline(UserEventPayload { user_id })
    }

    pub fn user_offline(user_id: Uuid) -> Self {
        Self::UserOffline(UserEventPayload { user_id })
    }

    pub fn messages_read(user_id: Uuid) -> Self {
        Self::MessagesRead(UserEventPayload { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_match_the_client_contract() {
        let cases = [
            (ServerEvent::user_typing(Uuid::nil()), "user_typing"),
            (ServerEvent::user_stop_typing(Uuid::nil()), "user_stop_typing"),
            (ServerEvent::user_online(Uuid::nil()), "user_online"),
            (ServerEvent::user_offline(Uuid::nil()), "user_offline"),
            (ServerEvent::messages_read(Uuid::nil()), "messages_read"),
            (
                ServerEvent::ScheduleUpdate(serde_json::json!({})),
                "schedule_update",
            ),
            (ServerEvent::NewCourse(serde_json::json!({})), "new_course"),
            (ServerEvent::NewMaterial(serde_json::json!({})), "new_material"),
            (ServerEvent::NewExam(serde_json::json!({})), "new_exam"),
        ];
        for (event, name) in cases {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["event"], name);
        }
    }

    #[test]
    fn user_payloads_use_camel_case() {
        let value = serde_json::to_value(ServerEvent::user_online(Uuid::nil())).unwrap();
        assert!(value["data"].get("userId").is_some());
    }
}
