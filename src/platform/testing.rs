//! In-memory fakes for the chat platform and the video fetcher.

use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use super::{IncomingMessage, Messenger, SentMessage};
use crate::link::TikTokLink;
use crate::tiktok::VideoFetcher;

/// Everything the bot did on the chat side, in order
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    Text { chat_id: i64, message_id: i32, text: String },
    Edit { message_id: i32, text: String },
    Delete { message_id: i32 },
    Video { chat_id: i64, bytes: Vec<u8>, caption: String },
}

#[derive(Default)]
pub struct RecordingMessenger {
    events: Mutex<Vec<ChatEvent>>,
    next_id: AtomicI32,
    fail_delete: bool,
    fail_video: bool,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn failing_video(mut self) -> Self {
        self.fail_video = true;
        self
    }

    pub fn events(&self) -> Vec<ChatEvent> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: ChatEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn next_message_id(&self) -> i32 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<SentMessage> {
        let message_id = self.next_message_id();
        self.record(ChatEvent::Text {
            chat_id,
            message_id,
            text: text.to_string(),
        });
        Ok(SentMessage {
            chat_id,
            message_id,
        })
    }

    async fn edit_text(&self, message: SentMessage, text: &str) -> Result<()> {
        self.record(ChatEvent::Edit {
            message_id: message.message_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn delete(&self, message: SentMessage) -> Result<()> {
        if self.fail_delete {
            bail!("message can't be deleted");
        }
        self.record(ChatEvent::Delete {
            message_id: message.message_id,
        });
        Ok(())
    }

    async fn send_video(
        &self,
        chat_id: i64,
        video: Vec<u8>,
        caption: &str,
    ) -> Result<SentMessage> {
        if self.fail_video {
            bail!("Request Entity Too Large");
        }
        let message_id = self.next_message_id();
        self.record(ChatEvent::Video {
            chat_id,
            bytes: video,
            caption: caption.to_string(),
        });
        Ok(SentMessage {
            chat_id,
            message_id,
        })
    }
}

/// Fetcher that returns a canned result and counts calls
pub struct StubFetcher {
    result: std::result::Result<Vec<u8>, String>,
    calls: AtomicUsize,
}

impl StubFetcher {
    pub fn returning(bytes: &[u8]) -> Self {
        Self {
            result: Ok(bytes.to_vec()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoFetcher for StubFetcher {
    async fn fetch(&self, _link: &TikTokLink) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().map_err(|e| anyhow!(e))
    }
}

pub fn incoming(text: &str) -> IncomingMessage {
    IncomingMessage {
        user_id: 42,
        chat_id: 1001,
        user_name: "tester".to_string(),
        text: text.to_string(),
    }
}
