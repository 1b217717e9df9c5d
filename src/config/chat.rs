use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct ChatConfig {
    /// Freshness window for cached user snapshots.
    pub user_cache_ttl: Duration,
    /// Websocket handshake must authenticate within this window or the
    /// connection is dropped.
    pub ws_auth_timeout: Duration,
    pub history_page_size: i64,
    pub history_max_page_size: i64,
}

impl ChatConfig {
    pub fn from_env() -> Self {
        Self {
            user_cache_ttl: Duration::from_secs(
                env::var("CHAT_USER_CACHE_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300), // 5 minutes
            ),
            ws_auth_timeout: Duration::from_secs(
                env::var("CHAT_WS_AUTH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            history_page_size: env::var("CHAT_HISTORY_PAGE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(50),
            history_max_page_size: env::var("CHAT_HISTORY_MAX_PAGE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100),
        }
    }
}
