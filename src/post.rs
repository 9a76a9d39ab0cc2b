//! Publisher adapter: message composition, platform sanitization, and the
//! HTTP call that creates a post.
//!
//! Messages are built as `prefix + title + suffix + " " + url` and then run
//! through a declared substitution table that defuses characters with
//! special meaning on the target platform. Sanitization is a pure function
//! so it can be tested without a network.

use crate::error::BotError;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// Characters the target platform treats specially, and their inert
/// replacements. A literal `"` becomes a typographic close quote, and `@`
/// gains a trailing space so it cannot form a mention.
const SUBSTITUTIONS: &[(&str, &str)] = &[("\"", "\u{201d}"), ("@", "@ ")];

/// Replace platform-significant characters per [`SUBSTITUTIONS`].
pub fn sanitize(text: &str) -> String {
    let mut out = text.to_string();
    for (from, to) in SUBSTITUTIONS {
        out = out.replace(from, to);
    }
    out
}

/// Compose the outgoing message for one entry.
///
/// Decorations are injected rather than baked in so tests and alternate
/// deployments can restyle the feed.
pub fn compose(prefix: &str, suffix: &str, title: &str, url: &str) -> String {
    sanitize(&format!("{prefix}{title}{suffix} {url}"))
}

/// Request body of the platform's create-post endpoint.
#[derive(Debug, Serialize)]
struct PostBody<'a> {
    text: &'a str,
}

/// Something that can deliver a composed message to the social feed.
pub trait Publish {
    async fn publish(&self, text: &str) -> Result<(), BotError>;
}

/// Publishes via the platform's JSON create-post endpoint with bearer
/// authorization. The endpoint is configurable so tests can point it at a
/// local mock.
#[derive(Debug)]
pub struct ApiPublisher {
    client: Client,
    endpoint: String,
    bearer_token: String,
}

impl ApiPublisher {
    pub fn new(client: Client, endpoint: impl Into<String>, bearer_token: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            bearer_token: bearer_token.into(),
        }
    }
}

impl Publish for ApiPublisher {
    #[instrument(level = "info", skip_all)]
    async fn publish(&self, text: &str) -> Result<(), BotError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.bearer_token)
            .json(&PostBody { text })
            .send()
            .await
            .map_err(|e| BotError::Publish {
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %detail, "Publish rejected");
            return Err(BotError::PublishStatus {
                status: status.as_u16(),
                detail,
            });
        }

        debug!(status = status.as_u16(), "Post created");
        info!(chars = text.chars().count(), "Published message");
        Ok(())
    }
}
