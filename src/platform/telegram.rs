use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId};
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};

use crate::platform::{IncomingMessage, Messenger, SentMessage};
use crate::router::{Command, Router};

/// `Messenger` backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<SentMessage> {
        let sent = self
            .bot
            .send_message(ChatId(chat_id), text)
            .await
            .context("Failed to send message")?;
        Ok(SentMessage {
            chat_id,
            message_id: sent.id.0,
        })
    }

    async fn edit_text(&self, message: SentMessage, text: &str) -> Result<()> {
        self.bot
            .edit_message_text(
                ChatId(message.chat_id),
                MessageId(message.message_id),
                text,
            )
            .await
            .context("Failed to edit message")?;
        Ok(())
    }

    async fn delete(&self, message: SentMessage) -> Result<()> {
        self.bot
            .delete_message(ChatId(message.chat_id), MessageId(message.message_id))
            .await
            .context("Failed to delete message")?;
        Ok(())
    }

    async fn send_video(
        &self,
        chat_id: i64,
        video: Vec<u8>,
        caption: &str,
    ) -> Result<SentMessage> {
        let sent = self
            .bot
            .send_video(
                ChatId(chat_id),
                InputFile::memory(video).file_name("video.mp4"),
            )
            .caption(caption)
            .await
            .context("Failed to send video")?;
        Ok(SentMessage {
            chat_id,
            message_id: sent.id.0,
        })
    }
}

/// Text messages with a known sender; everything else is ignored
fn incoming_from(msg: Message) -> Option<IncomingMessage> {
    let user = msg.from.as_ref()?;
    let text = msg.text()?;
    Some(IncomingMessage {
        user_id: user.id.0,
        chat_id: msg.chat.id.0,
        user_name: user.first_name.clone(),
        text: text.to_string(),
    })
}

/// Run the Telegram long-polling loop until Ctrl-C
pub async fn run(bot: Bot, router: Arc<Router>) -> Result<()> {
    info!("Starting Telegram platform...");

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!("Failed to register bot commands: {}", e);
    }

    let handler = Update::filter_message()
        .filter_map(incoming_from)
        .endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![router])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_message(
    bot: Bot,
    incoming: IncomingMessage,
    router: Arc<Router>,
) -> ResponseResult<()> {
    let messenger = TelegramMessenger::new(bot);

    if let Err(e) = router.handle(&messenger, &incoming).await {
        error!(
            "Failed to reply to user {} in chat {}: {:#}",
            incoming.user_id, incoming.chat_id, e
        );
    }

    Ok(())
}
