//! Chat data models and DTOs.
//!
//! Wire shapes here are shared by the REST controllers and the live channel,
//! so a message fetched over history is byte-for-byte what `new_message`
//! delivered. Field names are camelCase for client compatibility.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Closed set of user roles. Unknown roles from the directory deserialize to
/// [`Role::Other`] and are treated as "can only reach admins".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Teacher,
    Student,
    #[serde(other)]
    Other,
}

impl Role {
    /// Super admins and admins share the same chat reach.
    pub fn is_admin(self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin)
    }

    pub fn from_db(value: &str) -> Self {
        match value {
            "super_admin" => Role::SuperAdmin,
            "admin" => Role::Admin,
            "teacher" => Role::Teacher,
            "student" => Role::Student,
            _ => Role::Other,
        }
    }

    pub fn as_db(self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
            Role::Other => "other",
        }
    }
}

/// A user as seen in the directory. Owned by the wider school management
/// system; this core only ever reads it (possibly through the TTL cache).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub active: bool,
}

/// The projection of a user embedded in contact lists and message payloads.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub role: Role,
}

impl From<&UserRecord> for UserSummary {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            role: user.role,
        }
    }
}

/// Teacher profile row; `id` is the profile id referenced by assignment rows.
#[derive(Debug, Clone)]
pub struct TeacherProfile {
    pub id: Uuid,
}

/// Student profile row; at most one active class membership.
#[derive(Debug, Clone)]
pub struct StudentProfile {
    pub id: Uuid,
    pub class_id: Option<Uuid>,
    pub grade: Option<i32>,
}

/// One teacher-class-subject assignment row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub class_id: Uuid,
    pub subject_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[validate(url)]
    pub url: String,
    pub name: String,
    pub mime_type: String,
}

/// A persisted chat message. Append-only from this core; only the `read`
/// flag ever mutates, and only from false to true.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub content: String,
    pub attachments: Vec<Attachment>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::MessageStore::create`]. Callers must have already
/// validated that content or attachments is non-empty.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub content: String,
    pub attachments: Vec<Attachment>,
}

/// Per-counterpart message statistics from the one-pass aggregation.
#[derive(Debug, Clone)]
pub struct ContactStats {
    pub counterpart_id: Uuid,
    pub last_message: Message,
    pub unread_count: i64,
}

/// A contact list row: the counterpart plus their message stats. Derived per
/// request, never persisted.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactEntry {
    #[serde(flatten)]
    pub user: UserSummary,
    pub last_message: Option<Message>,
    pub last_message_time: DateTime<Utc>,
    pub unread_count: i64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageDto {
    pub recipient_id: Uuid,
    #[serde(default)]
    #[validate(length(max = 10000))]
    pub content: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub attachments: Vec<Attachment>,
}

/// `mark_read` takes either a single message id or a sender id for a bulk
/// "everything from them" update.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadDto {
    #[serde(default)]
    pub message_id: Option<Uuid>,
    #[serde(default)]
    pub sender_id: Option<Uuid>,
}

/// A history row with both participants embedded, as the REST clients expect.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryMessage {
    #[serde(flatten)]
    pub message: Message,
    pub sender: UserSummary,
    pub recipient: UserSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_db_strings() {
        for role in [Role::SuperAdmin, Role::Admin, Role::Teacher, Role::Student] {
            assert_eq!(Role::from_db(role.as_db()), role);
        }
        assert_eq!(Role::from_db("janitor"), Role::Other);
    }

    #[test]
    fn role_deserializes_unknown_as_other() {
        let role: Role = serde_json::from_str("\"librarian\"").unwrap();
        assert_eq!(role, Role::Other);
        let role: Role = serde_json::from_str("\"super_admin\"").unwrap();
        assert_eq!(role, Role::SuperAdmin);
    }

    #[test]
    fn message_serializes_camel_case() {
        let message = Message {
            id: Uuid::nil(),
            sender_id: Uuid::nil(),
            recipient_id: Uuid::nil(),
            content: "hi".into(),
            attachments: vec![Attachment {
                url: "https://files.example/a.pdf".into(),
                name: "a.pdf".into(),
                mime_type: "application/pdf".into(),
            }],
            read: false,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&message).unwrap();
        assert!(value.get("senderId").is_some());
        assert!(value.get("recipientId").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value["attachments"][0].get("mimeType").is_some());
    }

    #[test]
    fn contact_entry_flattens_user_fields() {
        let entry = ContactEntry {
            user: UserSummary {
                id: Uuid::nil(),
                username: "amina".into(),
                display_name: "Amina".into(),
                role: Role::Student,
            },
            last_message: None,
            last_message_time: DateTime::<Utc>::UNIX_EPOCH,
            unread_count: 0,
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["username"], "amina");
        assert_eq!(value["unreadCount"], 0);
        assert!(value["lastMessage"].is_null());
    }
}
