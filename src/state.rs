//! Shared application state.
//!
//! The session registry and user cache are process-scoped objects created
//! here at startup and injected into handlers; they are deliberately not
//! shared across instances (a horizontally scaled deployment needs an
//! external session/cache layer instead).

use std::sync::Arc;

use crate::cache::UserCache;
use crate::config::chat::ChatConfig;
use crate::config::cors::CorsConfig;
use crate::config::database::init_db_pool;
use crate::config::jwt::JwtConfig;
use crate::live::SessionRegistry;
use crate::modules::chat::service::ChatService;
use crate::store::postgres::{PgDirectoryStore, PgMessageStore};
use crate::store::{DirectoryStore, MessageStore};

#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<dyn DirectoryStore>,
    pub messages: Arc<dyn MessageStore>,
    pub sessions: Arc<SessionRegistry>,
    pub user_cache: Arc<UserCache>,
    pub chat: ChatService,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub chat_config: ChatConfig,
}

pub async fn init_app_state() -> AppState {
    let pool = init_db_pool().await;
    let directory: Arc<dyn DirectoryStore> = Arc::new(PgDirectoryStore::new(pool.clone()));
    let messages: Arc<dyn MessageStore> = Arc::new(PgMessageStore::new(pool));
    build_app_state(directory, messages)
}

/// Wires stores into the state; split from [`init_app_state`] so tests can
/// inject in-memory stores.
pub fn build_app_state(
    directory: Arc<dyn DirectoryStore>,
    messages: Arc<dyn MessageStore>,
) -> AppState {
    let chat_config = ChatConfig::from_env();
    let sessions = Arc::new(SessionRegistry::new());
    let user_cache = Arc::new(UserCache::new(chat_config.user_cache_ttl));
    let chat = ChatService::new(directory.clone(), messages.clone(), sessions.clone());

    AppState {
        directory,
        messages,
        sessions,
        user_cache,
        chat,
        jwt_config: JwtConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        chat_config,
    }
}
