use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::NotifyError;

/// Pub/sub channel the chat bridge relays into the room
pub const BROADCAST_CHANNEL: &str = "chat:broadcast";

/// Publishes broadcast lines to the chat system over Redis.
pub struct ChatClient {
    conn: ConnectionManager,
}

impl ChatClient {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    pub async fn send_broadcast(&self, message: &str) -> Result<(), NotifyError> {
        let payload = serde_json::json!({ "data": message }).to_string();
        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(BROADCAST_CHANNEL, payload).await?;
        Ok(())
    }
}
