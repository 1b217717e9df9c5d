//! The live channel: websocket upgrade, handshake authentication, and the
//! per-connection event loop.
//!
//! Client frames are `{"id": <any>, "event": "<name>", "data": {...}}`; the
//! server acknowledges frames that carry an `id` with
//! `{"id", "success", "data"|"error"}` and pushes server events as
//! `{"event", "data"}`. Event names are part of the client contract.

use std::collections::HashSet;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{FromRequestParts, Query, State};
use axum::http::header;
use axum::http::request::Parts;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::live::{ConnectionId, Room, ServerEvent};
use crate::modules::chat::model::{MarkReadDto, Role, SendMessageDto, UserRecord};
use crate::modules::chat::service::ChatError;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::verify_token;

#[derive(Debug, Deserialize)]
pub struct WsAuthParams {
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClientFrame {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(flatten)]
    event: ClientEvent,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
enum ClientEvent {
    GetContacts,
    SendMessage(SendMessageDto),
    Typing(TypingDto),
    StopTyping(TypingDto),
    MarkRead(MarkReadDto),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypingDto {
    recipient_id: Uuid,
}

#[derive(Debug, Serialize)]
struct Ack {
    id: serde_json::Value,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Ack {
    fn ok(id: serde_json::Value, data: Option<serde_json::Value>) -> Self {
        Self {
            id,
            success: true,
            data,
            error: None,
        }
    }

    fn err(id: serde_json::Value, error: String) -> Self {
        Self {
            id,
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

/// The authenticated principal behind a websocket handshake. The token comes
/// from the `token` query parameter or an `Authorization: Bearer` header, and
/// the directory lookup must finish within the configured window or the
/// connection is refused. Resolved before the upgrade is negotiated, so a bad
/// token is a plain 401 rather than a failed upgrade.
pub struct WsUser(pub UserRecord);

impl FromRequestParts<AppState> for WsUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<WsAuthParams>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::unauthorized("No token provided".to_string()))?;
        let token = params
            .token
            .or_else(|| {
                parts
                    .headers
                    .get(header::AUTHORIZATION)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.strip_prefix("Bearer "))
                    .map(str::to_string)
            })
            .ok_or_else(|| AppError::unauthorized("No token provided".to_string()))?;

        let claims = verify_token(&token, &state.jwt_config)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::unauthorized("Invalid user ID in token".to_string()))?;

        let lookup = state
            .user_cache
            .get_or_fetch(state.directory.as_ref(), user_id);
        let user = tokio::time::timeout(state.chat_config.ws_auth_timeout, lookup)
            .await
            .map_err(|_| AppError::unauthorized("Authentication timed out".to_string()))?
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::unauthorized("User not found".to_string()))?;

        if !user.active {
            return Err(AppError::unauthorized("Account is deactivated".to_string()));
        }
        Ok(WsUser(user))
    }
}

/// `GET /ws`: authenticates the handshake, then upgrades. Nothing is
/// registered until the upgrade completes.
pub async fn chat_ws(
    State(state): State<AppState>,
    WsUser(user): WsUser,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(state, user, socket))
}

async fn handle_socket(state: AppState, user: UserRecord, socket: WebSocket) {
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let connection = state.sessions.connect(user.id, tx).await;
    info!(user_id = %user.id, role = ?user.role, "user connected");

    // Class/grade rooms are joined asynchronously and best-effort; message
    // send/receive must not wait on them.
    {
        let state = state.clone();
        let user = user.clone();
        tokio::spawn(async move {
            if let Err(err) = join_role_rooms(&state, connection, &user).await {
                warn!(user_id = %user.id, error = %err, "failed to join broadcast rooms");
            }
        });
    }

    state
        .sessions
        .broadcast_except(connection, ServerEvent::user_online(user.id))
        .await;

    let (mut sink, mut stream) = socket.split();

    // Single loop owning the sink: registry pushes and acks interleave here,
    // and frames from this connection are processed in arrival order.
    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                let Ok(text) = serde_json::to_string(&event) else { continue };
                if sink.send(WsMessage::Text(text.into())).await.is_err() {
                    break;
                }
            }
            frame = stream.next() => {
                match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        let frame: ClientFrame = match serde_json::from_str(&text) {
                            Ok(frame) => frame,
                            Err(err) => {
                                warn!(user_id = %user.id, error = %err, "malformed client frame");
                                continue;
                            }
                        };
                        if let Some(ack) = dispatch(&state, &user, connection, frame).await {
                            let Ok(text) = serde_json::to_string(&ack) else { continue };
                            if sink.send(WsMessage::Text(text.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => {} // ping/pong and binary frames are ignored
                    Some(Err(_)) => break,
                }
            }
        }
    }

    state.sessions.disconnect(connection).await;
    state
        .sessions
        .broadcast_except(connection, ServerEvent::user_offline(user.id))
        .await;
    info!(user_id = %user.id, "user disconnected");
}

/// Handles one client frame. Returns an ack only when the frame carried a
/// correlation id; fire-and-forget frames (typing without an id) get none.
async fn dispatch(
    state: &AppState,
    user: &UserRecord,
    connection: ConnectionId,
    frame: ClientFrame,
) -> Option<Ack> {
    let result: Result<Option<serde_json::Value>, ChatError> = match frame.event {
        ClientEvent::GetContacts => state
            .chat
            .list_contacts(user)
            .await
            .and_then(|contacts| {
                serde_json::to_value(contacts).map_err(|e| ChatError::Store(e.into()))
            })
            .map(Some),
        ClientEvent::SendMessage(dto) => match dto.validate() {
            Err(err) => Err(ChatError::Validation(format!("Validation failed: {err}"))),
            Ok(()) => state
                .chat
                .send_message(user, dto, Some(connection))
                .await
                .and_then(|message| {
                    serde_json::to_value(message).map_err(|e| ChatError::Store(e.into()))
                })
                .map(Some),
        },
        ClientEvent::Typing(dto) => {
            state.chat.typing(user.id, dto.recipient_id, false).await;
            Ok(None)
        }
        ClientEvent::StopTyping(dto) => {
            state.chat.typing(user.id, dto.recipient_id, true).await;
            Ok(None)
        }
        ClientEvent::MarkRead(dto) => state.chat.mark_read(user, dto).await.map(|_| None),
    };

    if let Err(ChatError::Store(source)) = &result {
        tracing::error!(user_id = %user.id, error = %source, "live channel operation failed");
    }

    let id = frame.id?;
    Some(match result {
        Ok(data) => Ack::ok(id, data),
        Err(err @ (ChatError::NotAllowed | ChatError::Validation(_))) => {
            Ack::err(id, err.to_string())
        }
        Err(ChatError::Store(_)) => {
            Ack::err(id, "Something went wrong, please try again".to_string())
        }
    })
}

/// Joins the role-appropriate broadcast rooms: the student's class and grade,
/// or every class a teacher is assigned to.
async fn join_role_rooms(
    state: &AppState,
    connection: ConnectionId,
    user: &UserRecord,
) -> anyhow::Result<()> {
    match user.role {
        Role::Student => {
            if let Some(profile) = state.directory.find_student_profile(user.id).await? {
                if let Some(class_id) = profile.class_id {
                    state.sessions.join(connection, Room::Class(class_id)).await;
                }
                if let Some(grade) = profile.grade {
                    state.sessions.join(connection, Room::Grade(grade)).await;
                }
            }
        }
        Role::Teacher => {
            if let Some(profile) = state.directory.find_teacher_profile(user.id).await? {
                let assignments = state
                    .directory
                    .find_assignments_by_teacher(profile.id)
                    .await?;
                let classes: HashSet<Uuid> =
                    assignments.into_iter().map(|a| a.class_id).collect();
                for class_id in classes {
                    state.sessions.join(connection, Room::Class(class_id)).await;
                }
            }
        }
        Role::SuperAdmin | Role::Admin | Role::Other => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_message_frame() {
        let frame: ClientFrame = serde_json::from_str(
            r#"{
                "id": 7,
                "event": "send_message",
                "data": {
                    "recipientId": "00000000-0000-0000-0000-000000000001",
                    "content": "hello"
                }
            }"#,
        )
        .unwrap();
        assert_eq!(frame.id, Some(serde_json::json!(7)));
        match frame.event {
            ClientEvent::SendMessage(dto) => {
                assert_eq!(dto.content.as_deref(), Some("hello"));
                assert!(dto.attachments.is_empty());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn parses_get_contacts_without_data() {
        let frame: ClientFrame =
            serde_json::from_str(r#"{"id": "abc", "event": "get_contacts"}"#).unwrap();
        assert!(matches!(frame.event, ClientEvent::GetContacts));
    }

    #[test]
    fn parses_mark_read_variants() {
        let frame: ClientFrame = serde_json::from_str(
            r#"{"event": "mark_read", "data": {"senderId": "00000000-0000-0000-0000-000000000002"}}"#,
        )
        .unwrap();
        match frame.event {
            ClientEvent::MarkRead(dto) => {
                assert!(dto.message_id.is_none());
                assert!(dto.sender_id.is_some());
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(frame.id.is_none());
    }

    #[test]
    fn rejects_unknown_event_names() {
        let result = serde_json::from_str::<ClientFrame>(r#"{"event": "drop_tables"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn ack_omits_absent_fields() {
        let ack = Ack::ok(serde_json::json!(1), None);
        let value = serde_json::to_value(&ack).unwrap();
        assert_eq!(value["success"], true);
        assert!(value.get("data").is_none());
        assert!(value.get("error").is_none());

        let ack = Ack::err(serde_json::json!(2), "nope".into());
        let value = serde_json::to_value(&ack).unwrap();
        assert_eq!(value["error"], "nope");
    }
}
