use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::middleware::auth::{AuthUser, current_user};
use crate::modules::chat::model::{ContactEntry, HistoryMessage};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationParams;

#[derive(Debug, Serialize, ToSchema)]
pub struct ContactsResponse {
    pub success: bool,
    pub data: Vec<ContactEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryResponse {
    pub success: bool,
    pub data: Vec<HistoryMessage>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Same resolver as the live channel's `get_contacts`, so the two surfaces
/// can never disagree on who a user may chat with.
#[utoipa::path(
    get,
    path = "/api/chat/contacts",
    responses(
        (status = 200, description = "Contact list with last message and unread counts", body = ContactsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Chat"
)]
#[instrument(skip(state))]
pub async fn get_contacts(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ContactsResponse>, AppError> {
    let user = current_user(&state, &auth_user).await?;
    let contacts = state
        .chat
        .list_contacts(&user)
        .await
        .map_err(|e| e.into_app_error())?;
    Ok(Json(ContactsResponse {
        success: true,
        data: contacts,
    }))
}

#[utoipa::path(
    get,
    path = "/api/chat/history/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "Counterpart user id"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "Chronologically ascending message page", body = HistoryResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not allowed to chat with this user", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Chat"
)]
#[instrument(skip(state))]
pub async fn get_history(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(user_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<HistoryResponse>, AppError> {
    let user = current_user(&state, &auth_user).await?;
    let page = params.page();
    let limit = params.limit(
        state.chat_config.history_page_size,
        state.chat_config.history_max_page_size,
    );

    let messages = state
        .chat
        .history(&user, user_id, page, limit)
        .await
        .map_err(|e| e.into_app_error())?;
    Ok(Json(HistoryResponse {
        success: true,
        data: messages,
    }))
}
