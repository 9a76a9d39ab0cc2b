//! Error taxonomy for the syndication pipeline.
//!
//! Library modules detect failures and return them; only `main` decides
//! whether an error is fatal, recoverable, or escalated to the webhook
//! notifier. Nothing below `main` terminates the process.

use std::path::PathBuf;
use thiserror::Error;

/// All failure modes of a single run.
#[derive(Debug, Error)]
pub enum BotError {
    /// Required API credentials were not supplied. Raised pre-flight,
    /// before any network activity.
    #[error("bearer token required (set --bearer-token or FEEDPOST_BEARER_TOKEN)")]
    MissingCredentials,

    /// Transport-level failure while fetching the listing page.
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The listing page answered with a non-200 status.
    #[error("unexpected status {status} fetching {url}")]
    FetchStatus { status: u16, url: String },

    /// The configured page URL is not a valid absolute URL.
    #[error("invalid page url {url}: {source}")]
    PageUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Reading or appending the history file failed.
    #[error("history file {path}: {source}")]
    History {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Transport-level failure while publishing a message.
    #[error("publish failed: {detail}")]
    Publish { detail: String },

    /// The publish API answered with a non-success status.
    #[error("publish rejected with status {status}: {detail}")]
    PublishStatus { status: u16, detail: String },

    /// Transport-level failure while delivering the webhook alert.
    #[error("webhook notify failed: {detail}")]
    Notify { detail: String },

    /// The webhook endpoint answered with a non-success status.
    #[error("webhook rejected with status {status}")]
    NotifyStatus { status: u16 },
}
