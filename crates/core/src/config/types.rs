use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub feed: FeedConfig,
}

/// Remote catalog gateway configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// API base URL (default: https://api.jikan.moe/v4)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// User-Agent header sent with every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            user_agent: None,
        }
    }
}

fn default_base_url() -> String {
    "https://api.jikan.moe/v4".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Search-as-you-type configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke before a preview is fetched.
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,
    /// Entries requested for the live preview.
    #[serde(default = "default_preview_page_size")]
    pub preview_page_size: u32,
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce(),
            preview_page_size: default_preview_page_size(),
        }
    }
}

fn default_debounce() -> u64 {
    250
}

fn default_preview_page_size() -> u32 {
    5
}

/// Feed configuration (home page and committed search results)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    /// Entries per page of committed search results.
    #[serde(default = "default_results_page_size")]
    pub results_page_size: u32,
    /// Entries requested per page of the newest releases feed.
    #[serde(default = "default_newest_page_size")]
    pub newest_page_size: u32,
    /// Entries shown from the newest releases feed after deduplication.
    #[serde(default = "default_newest_display_limit")]
    pub newest_display_limit: usize,
    /// Entries in the top airing list.
    #[serde(default = "default_top_limit")]
    pub top_limit: u32,
    /// Entries requested from the current season to pick the banner from.
    #[serde(default = "default_highlight_limit")]
    pub highlight_limit: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            results_page_size: default_results_page_size(),
            newest_page_size: default_newest_page_size(),
            newest_display_limit: default_newest_display_limit(),
            top_limit: default_top_limit(),
            highlight_limit: default_highlight_limit(),
        }
    }
}

fn default_results_page_size() -> u32 {
    12
}

fn default_newest_page_size() -> u32 {
    25
}

fn default_newest_display_limit() -> usize {
    12
}

fn default_top_limit() -> u32 {
    5
}

fn default_highlight_limit() -> u32 {
    1
}
