use crate::modules::chat::controller::{get_contacts, get_history};
use crate::state::AppState;
use axum::{Router, routing::get};

pub fn init_chat_router() -> Router<AppState> {
    Router::new()
        .route("/contacts", get(get_contacts))
        .route("/history/{user_id}", get(get_history))
}
