use std::fmt;

use anyhow::{bail, Context, Result};
use lazy_regex::{lazy_regex, Lazy};
use regex::Regex;
use reqwest::Url;

/// Hosts that serve TikTok video pages or short links.
const TIKTOK_HOSTS: &[&str] = &["tiktok.com", "www.tiktok.com", "vm.tiktok.com", "m.tiktok.com"];

static RE_TIKTOK_MENTION: Lazy<Regex> = lazy_regex!(r"(?i)tiktok\.com");

/// Returns true if `host` is one of the accepted TikTok hosts (case-insensitive).
pub fn is_tiktok_host(host: &str) -> bool {
    let host = host.trim_end_matches('.');
    TIKTOK_HOSTS.iter().any(|h| h.eq_ignore_ascii_case(host))
}

/// Returns true if `tiktok.com` appears anywhere in the text (case-insensitive).
///
/// Look-alike hosts match too; `TikTokLink::parse` is what rejects them.
pub fn mentions_tiktok(text: &str) -> bool {
    RE_TIKTOK_MENTION.is_match(text)
}

/// A validated link to a TikTok page, always normalized to `https`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TikTokLink {
    url: Url,
}

impl TikTokLink {
    /// Parse message text as a single TikTok URL. The scheme is optional.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            bail!("empty link");
        }
        if text.chars().any(char::is_whitespace) {
            bail!("expected a single link, got extra text");
        }

        let candidate = if text.contains("://") {
            text.to_string()
        } else {
            format!("https://{}", text)
        };

        let mut url =
            Url::parse(&candidate).with_context(|| format!("not a valid URL: {}", text))?;

        match url.scheme() {
            "https" => {}
            "http" => {
                if url.set_scheme("https").is_err() {
                    bail!("cannot upgrade link to https: {}", text);
                }
            }
            other => bail!("unsupported scheme: {}", other),
        }

        let host = url.host_str().context("link has no host")?;
        if !is_tiktok_host(host) {
            bail!("not a TikTok host: {}", host);
        }

        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Display for TikTokLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}
