//! Command-line interface for feedpost.
//!
//! Every option can be supplied as a flag or, where it is a secret or
//! deployment detail, via an environment variable. The bot is meant to run
//! from cron, so the defaults favor a zero-flag invocation once the token
//! is in the environment.

use crate::pipeline::CommitPolicy;
use clap::Parser;
use std::path::PathBuf;

/// Scrape a news listing page and post not-yet-published items to a social feed.
///
/// # Examples
///
/// ```sh
/// # Preview what would be posted, seeding history without network writes
/// feedpost --page-url https://example.edu/whatsnew/ --dry-run
///
/// # Normal scheduled invocation
/// FEEDPOST_BEARER_TOKEN=... feedpost --page-url https://example.edu/whatsnew/ \
///     --webhook-url https://hooks.example.com/T000/B000
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// URL of the news listing page to scrape
    #[arg(short, long, env = "FEEDPOST_PAGE_URL")]
    pub page_url: String,

    /// CSS selector matching the news container's anchors
    #[arg(long, default_value = "#news_block a")]
    pub selector: String,

    /// Bearer token for the publish API (required unless --dry-run)
    #[arg(long, env = "FEEDPOST_BEARER_TOKEN")]
    pub bearer_token: Option<String>,

    /// Path of the published-URL history file (default: ~/.feedpost.log)
    #[arg(short, long)]
    pub save_file: Option<PathBuf>,

    /// Webhook URL alerted when a publish attempt fails
    #[arg(long, env = "FEEDPOST_WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    /// Print messages without calling the publish API; history is still committed
    #[arg(long)]
    pub dry_run: bool,

    /// When published URLs are appended to history
    #[arg(long, value_enum, default_value = "batch")]
    pub commit_policy: CommitPolicy,

    /// Label prepended to every message
    #[arg(long, default_value = "[News] ")]
    pub prefix: String,

    /// Tag appended to every title, before the URL
    #[arg(long, default_value = " #news")]
    pub suffix: String,

    /// Publish API endpoint
    #[arg(long, default_value = "https://api.x.com/2/tweets")]
    pub post_endpoint: String,

    /// Timeout in seconds applied to every outbound HTTP call
    #[arg(long, default_value = "30", value_name = "SECS")]
    pub timeout_secs: u64,
}

impl Cli {
    /// Resolve the history file path, defaulting to a dotfile in the home
    /// directory (or the working directory when no home is known).
    pub fn save_file(&self) -> PathBuf {
        self.save_file.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".feedpost.log")
        })
    }
}
