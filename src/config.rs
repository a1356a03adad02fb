use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable holding the Telegram bot token
pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Environment variable that overrides the config file location
pub const CONFIG_PATH_ENV: &str = "TIKTOK_BOT_CONFIG";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub tiktok: TikTokConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TikTokConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Largest video the bot will upload (Telegram caps bot uploads at 50 MB)
    #[serde(default = "default_max_video_bytes")]
    pub max_video_bytes: u64,
    /// Per-request HTTP timeout; none unless set
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for TikTokConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            max_video_bytes: default_max_video_bytes(),
            request_timeout_secs: None,
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
        .to_string()
}

fn default_max_video_bytes() -> u64 {
    50 * 1024 * 1024
}

/// Config file location: `$TIKTOK_BOT_CONFIG`, else `config.toml`
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

impl Config {
    /// Load the optional config file and apply the token from the environment.
    /// A missing file means defaults; a missing token is an error.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_token(path, std::env::var(TOKEN_ENV).ok())
    }

    /// Same as `load`, with the environment token passed in
    pub fn load_with_token(path: &Path, env_token: Option<String>) -> Result<Self> {
        let content = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Some(content)
        } else {
            None
        };

        Self::from_sources(content.as_deref(), env_token)
            .with_context(|| format!("Invalid configuration ({})", path.display()))
    }

    /// Build the config from file contents (if any) and the environment token.
    /// The environment token wins over `[telegram] bot_token`.
    pub fn from_sources(file_content: Option<&str>, env_token: Option<String>) -> Result<Self> {
        let mut config: Config = match file_content {
            Some(content) => toml::from_str(content).context("Failed to parse config file")?,
            None => Config::default(),
        };

        if let Some(token) = env_token.map(|t| t.trim().to_string()) {
            if !token.is_empty() {
                config.telegram.bot_token = token;
            }
        }

        if config.telegram.bot_token.trim().is_empty() {
            bail!("{} not set in environment!", TOKEN_ENV);
        }

        if config.tiktok.max_video_bytes == 0 {
            bail!("tiktok.max_video_bytes must be greater than zero");
        }

        Ok(config)
    }
}
