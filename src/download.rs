use anyhow::Result;
use tracing::{error, info, warn};

use crate::link::TikTokLink;
use crate::platform::{IncomingMessage, Messenger};
use crate::tiktok::VideoFetcher;

pub const INVALID_URL_TEXT: &str = "❌ Invalid TikTok URL.";
pub const DOWNLOADING_TEXT: &str = "⏳ Downloading video, please wait...";
pub const SUCCESS_CAPTION: &str = "✅ Downloaded!";

pub fn error_text(err: &anyhow::Error) -> String {
    format!("❌ Error downloading video: {:#}", err)
}

/// Validate the link, fetch the video and send it back.
///
/// Retrieval failures end up in the chat, never in the returned `Result`;
/// only errors talking to the chat platform itself are returned.
pub async fn handle(
    messenger: &dyn Messenger,
    fetcher: &dyn VideoFetcher,
    msg: &IncomingMessage,
) -> Result<()> {
    let link = match TikTokLink::parse(&msg.text) {
        Ok(link) => link,
        Err(e) => {
            info!("Rejected link from user {}: {:#}", msg.user_id, e);
            messenger.send_text(msg.chat_id, INVALID_URL_TEXT).await?;
            return Ok(());
        }
    };

    let placeholder = messenger.send_text(msg.chat_id, DOWNLOADING_TEXT).await?;

    let video = match fetcher.fetch(&link).await {
        Ok(video) => video,
        Err(e) => {
            error!("Error downloading {} for user {}: {:#}", link, msg.user_id, e);
            messenger.edit_text(placeholder, &error_text(&e)).await?;
            return Ok(());
        }
    };

    if let Err(e) = messenger.delete(placeholder).await {
        warn!("Failed to delete placeholder message: {:#}", e);
    }

    match messenger
        .send_video(msg.chat_id, video, SUCCESS_CAPTION)
        .await
    {
        Ok(_) => info!("Video sent to user {}", msg.user_id),
        Err(e) => {
            error!("Error sending video to user {}: {:#}", msg.user_id, e);
            messenger.send_text(msg.chat_id, &error_text(&e)).await?;
        }
    }

    Ok(())
}
