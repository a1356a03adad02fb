pub mod telegram;

#[cfg(test)]
pub mod testing;

use anyhow::Result;
use async_trait::async_trait;

/// A text message received from the chat platform
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Platform-specific user ID
    pub user_id: u64,
    /// Chat the message was sent in; replies go here
    pub chat_id: i64,
    /// Display name of the user
    pub user_name: String,
    /// The message text
    pub text: String,
}

/// Handle to a message the bot has sent, so it can be edited or deleted later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: i64,
    pub message_id: i32,
}

/// Outbound side of the chat platform.
///
/// The router and download handler only talk to this trait, which keeps them
/// free of Telegram types.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<SentMessage>;

    async fn edit_text(&self, message: SentMessage, text: &str) -> Result<()>;

    async fn delete(&self, message: SentMessage) -> Result<()>;

    /// Send raw video bytes as a video attachment with a caption
    async fn send_video(&self, chat_id: i64, video: Vec<u8>, caption: &str)
        -> Result<SentMessage>;
}
