use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::chat::controller::{ContactsResponse, ErrorResponse, HistoryResponse};
use crate::modules::chat::model::{
    Attachment, ContactEntry, HistoryMessage, MarkReadDto, Message, Role, SendMessageDto,
    UserSummary,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::chat::controller::get_contacts,
        crate::modules::chat::controller::get_history,
    ),
    components(
        schemas(
            Role,
            UserSummary,
            Attachment,
            Message,
            ContactEntry,
            HistoryMessage,
            SendMessageDto,
            MarkReadDto,
            ContactsResponse,
            HistoryResponse,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Chat", description = "Contact lists and message history; real-time delivery runs over the websocket at /ws")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
