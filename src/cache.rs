//! Shared site cache. The stream poller and the auth subsystem live in
//! other processes; Redis is the meeting point. A memory backend stands in
//! for development and tests.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use thiserror::Error;

/// Cache key holding the precomputed stream state blob
pub const STREAM_INFO_KEY: &str = "streaminfo";

/// Pub/sub channel the auth layer watches for stale-user signals
pub const USER_UPDATES_CHANNEL: &str = "refreshuser";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("Malformed cache entry: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[async_trait]
pub trait SiteCache: Send + Sync {
    /// The stream state blob, if the poller has published one
    async fn stream_info(&self) -> Result<Option<serde_json::Value>, CacheError>;

    async fn set_stream_info(&self, info: &serde_json::Value) -> Result<(), CacheError>;

    /// Signal that a user's cached role/subscription state is stale
    async fn flag_user_for_update(&self, user_id: &str) -> Result<(), CacheError>;
}

// ============================================================================
// Redis backend
// ============================================================================

pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }

    /// Clone of the underlying connection, for other Redis consumers
    /// (the chat broadcast client shares it).
    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

#[async_trait]
impl SiteCache for RedisCache {
    async fn stream_info(&self) -> Result<Option<serde_json::Value>, CacheError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(STREAM_INFO_KEY).await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set_stream_info(&self, info: &serde_json::Value) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(STREAM_INFO_KEY, info.to_string())
            .await?;
        Ok(())
    }

    async fn flag_user_for_update(&self, user_id: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(USER_UPDATES_CHANNEL, user_id)
            .await?;
        Ok(())
    }
}

// ============================================================================
// Memory backend (development and tests)
// ============================================================================

/// In-process stand-in for Redis. Flagged users are retained so tests can
/// assert on the invalidation signal.
#[derive(Default)]
pub struct MemoryCache {
    stream_info: tokio::sync::RwLock<Option<serde_json::Value>>,
    flagged: tokio::sync::Mutex<Vec<String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn flagged_users(&self) -> Vec<String> {
        self.flagged.lock().await.clone()
    }
}

#[async_trait]
impl SiteCache for MemoryCache {
    async fn stream_info(&self) -> Result<Option<serde_json::Value>, CacheError> {
        Ok(self.stream_info.read().await.clone())
    }

    async fn set_stream_info(&self, info: &serde_json::Value) -> Result<(), CacheError> {
        *self.stream_info.write().await = Some(info.clone());
        Ok(())
    }

    async fn flag_user_for_update(&self, user_id: &str) -> Result<(), CacheError> {
        self.flagged.lock().await.push(user_id.to_string());
        Ok(())
    }
}
