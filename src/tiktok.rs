use std::collections::HashMap;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use lazy_regex::{lazy_regex, Lazy};
use regex::Regex;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, RANGE, REFERER};
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::TikTokConfig;
use crate::link::TikTokLink;

const TIKTOK_REFERER: &str = "https://www.tiktok.com/";

static RE_REHYDRATION_SCRIPT: Lazy<Regex> = lazy_regex!(
    r#"(?s)<script[^>]*\bid="__UNIVERSAL_DATA_FOR_REHYDRATION__"[^>]*>(.*?)</script>"#
);
static RE_SIGI_SCRIPT: Lazy<Regex> =
    lazy_regex!(r#"(?s)<script[^>]*\bid="SIGI_STATE"[^>]*>(.*?)</script>"#);
static RE_VIDEO_ID: Lazy<Regex> = lazy_regex!(r"/video/(\d+)");

/// Fetches the raw bytes of the video behind a TikTok link
#[async_trait]
pub trait VideoFetcher: Send + Sync {
    async fn fetch(&self, link: &TikTokLink) -> Result<Vec<u8>>;
}

// ── Page data ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RehydrationData {
    #[serde(rename = "__DEFAULT_SCOPE__", default)]
    default_scope: DefaultScope,
}

#[derive(Debug, Default, Deserialize)]
struct DefaultScope {
    #[serde(rename = "webapp.video-detail")]
    video_detail: Option<VideoDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoDetail {
    #[serde(default)]
    status_code: i64,
    #[serde(default)]
    status_msg: Option<String>,
    item_info: Option<ItemInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemInfo {
    item_struct: VideoItem,
}

#[derive(Debug, Deserialize)]
struct SigiState {
    #[serde(rename = "ItemModule", default)]
    item_module: HashMap<String, VideoItem>,
}

/// The part of a TikTok post description needed to download the video
#[derive(Debug, Clone, Deserialize)]
pub struct VideoItem {
    #[serde(default)]
    pub id: String,
    pub video: VideoInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    #[serde(default)]
    pub play_addr: Option<String>,
    #[serde(default)]
    pub download_addr: Option<String>,
}

impl VideoItem {
    /// Address of the video stream, preferring the watermark-free play address
    pub fn play_address(&self) -> Result<&str> {
        [&self.video.play_addr, &self.video.download_addr]
            .into_iter()
            .filter_map(|addr| addr.as_deref())
            .find(|addr| !addr.is_empty())
            .with_context(|| format!("video {} has no playable address", self.id))
    }
}

/// Extract the numeric video ID from a canonical page URL (`/@user/video/<id>`)
pub fn video_id_from_url(url: &Url) -> Option<String> {
    RE_VIDEO_ID
        .captures(url.path())
        .map(|caps| caps[1].to_string())
}

/// Find the video description embedded in a TikTok page.
///
/// Newer pages carry it in `__UNIVERSAL_DATA_FOR_REHYDRATION__`, older ones in
/// `SIGI_STATE` keyed by video ID.
pub fn extract_video_item(html: &str, video_id: Option<&str>) -> Result<VideoItem> {
    if let Some(caps) = RE_REHYDRATION_SCRIPT.captures(html) {
        let data: RehydrationData = serde_json::from_str(&caps[1])
            .context("Failed to parse rehydration data")?;
        if let Some(detail) = data.default_scope.video_detail {
            if detail.status_code != 0 {
                bail!(
                    "TikTok returned status {}: {}",
                    detail.status_code,
                    detail.status_msg.as_deref().unwrap_or("video unavailable")
                );
            }
            return detail
                .item_info
                .map(|info| info.item_struct)
                .context("video detail has no item info");
        }
    }

    if let Some(caps) = RE_SIGI_SCRIPT.captures(html) {
        let state: SigiState =
            serde_json::from_str(&caps[1]).context("Failed to parse SIGI_STATE")?;
        let mut items = state.item_module;
        let item = match video_id {
            Some(id) => items.remove(id),
            None if items.len() == 1 => items.into_values().next(),
            None => None,
        };
        return item.context("video not found in SIGI_STATE");
    }

    bail!("no video data found on page")
}

// ── HTTP client ───────────────────────────────────────────────────────────────

/// Retrieval client that scrapes TikTok's web pages
pub struct TikTokClient {
    client: reqwest::Client,
    max_video_bytes: u64,
}

impl TikTokClient {
    pub fn new(config: &TikTokConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            max_video_bytes: config.max_video_bytes,
        })
    }

    /// Load the video page, following short-link redirects.
    /// Returns the final URL together with the HTML.
    async fn load_page(&self, url: &Url) -> Result<(Url, String)> {
        debug!("Loading TikTok page: {}", url);

        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "text/html,application/xhtml+xml")
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await
            .context("Failed to request TikTok page")?;

        let status = response.status();
        if !status.is_success() {
            bail!("TikTok page request failed ({})", status);
        }

        let final_url = response.url().clone();
        let html = response
            .text()
            .await
            .context("Failed to read TikTok page")?;

        Ok((final_url, html))
    }

    /// Stream the video body, giving up as soon as it passes `max_video_bytes`
    async fn download(&self, address: &str) -> Result<Vec<u8>> {
        debug!("Downloading video stream: {}", address);

        let mut response = self
            .client
            .get(address)
            .header(REFERER, TIKTOK_REFERER)
            .header(RANGE, "bytes=0-")
            .send()
            .await
            .context("Failed to request video stream")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Video download failed ({})", status);
        }

        if let Some(len) = response.content_length() {
            if len > self.max_video_bytes {
                bail!(
                    "video is too large ({} bytes, limit {})",
                    len,
                    self.max_video_bytes
                );
            }
        }

        let mut video = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .context("Failed to read video stream")?
        {
            append_chunk(&mut video, &chunk, self.max_video_bytes)?;
        }

        if video.is_empty() {
            bail!("downloaded video is empty");
        }
        Ok(video)
    }

    async fn fetch_url(&self, url: &Url) -> Result<Vec<u8>> {
        let (page_url, html) = self.load_page(url).await?;
        let video_id = video_id_from_url(&page_url);

        let item = extract_video_item(&html, video_id.as_deref())?;
        let address = item.play_address()?;

        let bytes = self.download(address).await?;
        info!(
            "Fetched video {} ({} bytes) from {}",
            item.id,
            bytes.len(),
            page_url
        );
        Ok(bytes)
    }
}

fn append_chunk(video: &mut Vec<u8>, chunk: &[u8], max_video_bytes: u64) -> Result<()> {
    let total = (video.len() + chunk.len()) as u64;
    if total > max_video_bytes {
        bail!("video is too large (over the {} byte limit)", max_video_bytes);
    }
    video.extend_from_slice(chunk);
    Ok(())
}

#[async_trait]
impl VideoFetcher for TikTokClient {
    async fn fetch(&self, link: &TikTokLink) -> Result<Vec<u8>> {
        self.fetch_url(link.url()).await
    }
}
