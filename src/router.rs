use std::sync::Arc;

use anyhow::Result;
use teloxide::utils::command::BotCommands;
use tracing::info;

use crate::download;
use crate::link;
use crate::platform::{IncomingMessage, Messenger};
use crate::tiktok::VideoFetcher;

pub const START_TEXT: &str = "🎵 Send me a TikTok link to download!";
pub const HELP_TEXT: &str = "Send me a TikTok video link and I will download it for you!";
pub const FALLBACK_TEXT: &str = "🎵 Please send a TikTok video link!";

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    #[command(description = "start the bot")]
    Start,
    #[command(description = "show how to use the bot")]
    Help,
}

impl Command {
    pub fn reply_text(&self) -> &'static str {
        match self {
            Command::Start => START_TEXT,
            Command::Help => HELP_TEXT,
        }
    }
}

/// Where an incoming message goes
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Command(Command),
    Download,
    Fallback,
}

/// Pick the handler for a message. Only the first word is parsed as a
/// command, so `/start anything` still counts as `/start`.
pub fn route(text: &str, bot_username: &str) -> Route {
    let text = text.trim();

    if let Some(first) = text.split_whitespace().next() {
        if first.starts_with('/') {
            return match Command::parse(first, bot_username) {
                Ok(command) => Route::Command(command),
                Err(_) => Route::Fallback,
            };
        }
    }

    if link::mentions_tiktok(text) {
        Route::Download
    } else {
        Route::Fallback
    }
}

/// Dispatches each message to exactly one handler
pub struct Router {
    fetcher: Arc<dyn VideoFetcher>,
    bot_username: String,
}

impl Router {
    pub fn new(fetcher: Arc<dyn VideoFetcher>, bot_username: impl Into<String>) -> Self {
        Self {
            fetcher,
            bot_username: bot_username.into(),
        }
    }

    pub async fn handle(&self, messenger: &dyn Messenger, msg: &IncomingMessage) -> Result<()> {
        let route = route(&msg.text, &self.bot_username);
        info!(
            "Message from {} ({}) routed to {:?}",
            msg.user_name, msg.user_id, route
        );

        match route {
            Route::Command(command) => {
                messenger
                    .send_text(msg.chat_id, command.reply_text())
                    .await?;
            }
            Route::Download => {
                download::handle(messenger, self.fetcher.as_ref(), msg).await?;
            }
            Route::Fallback => {
                messenger.send_text(msg.chat_id, FALLBACK_TEXT).await?;
            }
        }

        Ok(())
    }
}
