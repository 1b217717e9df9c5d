//! Chat business logic, shared verbatim by the REST controllers and the live
//! channel so both paths resolve permissions and contacts identically.

use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use crate::live::events::NewMessagePayload;
use crate::live::{ConnectionId, Room, ServerEvent, SessionRegistry};
use crate::modules::chat::model::{
    ContactEntry, HistoryMessage, MarkReadDto, NewMessage, SendMessageDto, UserRecord,
    UserSummary,
};
use crate::modules::chat::{contacts, permissions};
use crate::store::{DirectoryStore, MessageStore};
use crate::utils::errors::AppError;

/// Chat failures, kept typed so the live channel can ack "not allowed"
/// distinctly from "try again" and the REST path can pick status codes.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("You are not allowed to chat with this user")]
    NotAllowed,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl ChatError {
    /// Status mapping for the REST path. Not a `From` impl because the
    /// blanket `anyhow -> AppError` conversion would overlap with it.
    pub fn into_app_error(self) -> AppError {
        match self {
            ChatError::NotAllowed => AppError::forbidden(self.to_string()),
            ChatError::Validation(message) => {
                AppError::bad_request(anyhow::anyhow!("{message}"))
            }
            ChatError::Store(source) => AppError::database(source),
        }
    }
}

#[derive(Clone)]
pub struct ChatService {
    directory: Arc<dyn DirectoryStore>,
    messages: Arc<dyn MessageStore>,
    sessions: Arc<SessionRegistry>,
}

impl ChatService {
    pub fn new(
        directory: Arc<dyn DirectoryStore>,
        messages: Arc<dyn MessageStore>,
        sessions: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            directory,
            messages,
            sessions,
        }
    }

    /// May `sender` exchange messages with `recipient_id`? Always re-resolved
    /// against the directory, never cached.
    pub async fn can_exchange(
        &self,
        sender: &UserRecord,
        recipient_id: Uuid,
    ) -> Result<bool, ChatError> {
        permissions::can_exchange(self.directory.as_ref(), sender, recipient_id).await
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn list_contacts(&self, user: &UserRecord) -> Result<Vec<ContactEntry>, ChatError> {
        contacts::list_contacts(self.directory.as_ref(), self.messages.as_ref(), user).await
    }

    /// Paginated, chronologically ascending history for a permitted pair.
    /// Permission is checked once, before any message store access.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn history(
        &self,
        user: &UserRecord,
        other_id: Uuid,
        page: i64,
        page_size: i64,
    ) -> Result<Vec<HistoryMessage>, ChatError> {
        if !self.can_exchange(user, other_id).await? {
            return Err(ChatError::NotAllowed);
        }

        // can_exchange already established the counterpart exists.
        let other = self
            .directory
            .find_user_by_id(other_id)
            .await?
            .ok_or(ChatError::NotAllowed)?;
        let own_summary = UserSummary::from(user);
        let other_summary = UserSummary::from(&other);

        let messages = self
            .messages
            .find_between(user.id, other_id, page, page_size)
            .await?;
        Ok(messages
            .into_iter()
            .map(|message| {
                let (sender, recipient) = if message.sender_id == user.id {
                    (own_summary.clone(), other_summary.clone())
                } else {
                    (other_summary.clone(), own_summary.clone())
                };
                HistoryMessage {
                    message,
                    sender,
                    recipient,
                }
            })
            .collect())
    }

    /// Validates, re-checks permission, persists, then fans the message out
    /// to the recipient's personal room and the sender's other sessions. A
    /// persistence failure surfaces before anything is broadcast.
    #[instrument(skip(self, sender, dto), fields(sender_id = %sender.id))]
    pub async fn send_message(
        &self,
        sender: &UserRecord,
        dto: SendMessageDto,
        origin: Option<ConnectionId>,
    ) -> Result<crate::modules::chat::model::Message, ChatError> {
        let content = dto.content.unwrap_or_default().trim().to_string();
        if content.is_empty() && dto.attachments.is_empty() {
            return Err(ChatError::Validation(
                "Recipient and content/attachments are required".to_string(),
            ));
        }

        if !self.can_exchange(sender, dto.recipient_id).await? {
            return Err(ChatError::NotAllowed);
        }

        let message = self
            .messages
            .create(NewMessage {
                sender_id: sender.id,
                recipient_id: dto.recipient_id,
                content,
                attachments: dto.attachments,
            })
            .await?;

        let payload = NewMessagePayload {
            message: message.clone(),
            sender: UserSummary::from(sender),
        };
        self.sessions
            .publish(
                Room::User(message.recipient_id),
                ServerEvent::NewMessage(payload.clone()),
            )
            .await;
        self.sessions
            .publish_except(
                Room::User(sender.id),
                origin,
                ServerEvent::NewMessage(payload),
            )
            .await;

        Ok(message)
    }

    /// Marks one message (by id) or everything from a sender as read, then
    /// notifies the original sender's sessions with `messages_read` so unread
    /// badges update without polling.
    #[instrument(skip(self, user, dto), fields(user_id = %user.id))]
    pub async fn mark_read(&self, user: &UserRecord, dto: MarkReadDto) -> Result<(), ChatError> {
        if let Some(message_id) = dto.message_id {
            // The update is recipient-scoped, so a caller holding someone
            // else's message id flips nothing.
            if let Some(message) = self.messages.mark_one_read(message_id, user.id).await? {
                self.sessions
                    .publish(
                        Room::User(message.sender_id),
                        ServerEvent::messages_read(user.id),
                    )
                    .await;
            }
        } else if let Some(sender_id) = dto.sender_id {
            let updated = self.messages.mark_all_read_from(sender_id, user.id).await?;
            if updated > 0 {
                self.sessions
                    .publish(Room::User(sender_id), ServerEvent::messages_read(user.id))
                    .await;
            }
        }
        Ok(())
    }

    /// Ephemeral typing signal to the recipient's personal room. No
    /// persistence and no permission re-check; it carries no content and only
    /// reaches a room the recipient owns.
    pub async fn typing(&self, from: Uuid, recipient_id: Uuid, stopped: bool) {
        let event = if stopped {
            ServerEvent::user_stop_typing(from)
        } else {
            ServerEvent::user_typing(from)
        };
        self.sessions.publish(Room::User(recipient_id), event).await;
    }

    /// Fan-out hook for collaborator subsystems (schedules, courses,
    /// materials, exams) reusing the class room model.
    pub async fn broadcast_to_class(&self, class_id: Uuid, event: ServerEvent) {
        self.sessions.publish(Room::Class(class_id), event).await;
    }

    pub async fn broadcast_to_grade(&self, grade: i32, event: ServerEvent) {
        self.sessions.publish(Room::Grade(grade), event).await;
    }
}
