//! Listing-page scraper.
//!
//! Fetches the configured news-listing page and extracts one [`Entry`] per
//! anchor carrying both a `title` and an `href` attribute. The page is
//! assumed to list newest items first; document order is preserved so the
//! caller can reverse it before publishing.
//!
//! Failure posture is deliberately asymmetric: a transport error or non-200
//! status is an error (the run must not touch history on a blind fetch),
//! while a structurally unexpected page degrades to an empty entry list and
//! the run proceeds harmlessly with nothing new to post.

use crate::error::BotError;
use crate::models::Entry;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Fetch the listing page and extract its entries.
///
/// Issues a single GET with the shared client (no retry: a failed fetch is
/// fatal to the run). Anchors are matched by `selector`, a CSS selector
/// scoped to the news container, e.g. `#news_block a`.
#[instrument(level = "info", skip(client))]
pub async fn fetch_entries(
    client: &Client,
    page_url: &str,
    selector: &str,
) -> Result<Vec<Entry>, BotError> {
    let base = Url::parse(page_url).map_err(|source| BotError::PageUrl {
        url: page_url.to_string(),
        source,
    })?;

    let response = client
        .get(page_url)
        .send()
        .await
        .map_err(|source| BotError::Fetch {
            url: page_url.to_string(),
            source,
        })?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(BotError::FetchStatus {
            status: status.as_u16(),
            url: page_url.to_string(),
        });
    }

    let html = response.text().await.map_err(|source| BotError::Fetch {
        url: page_url.to_string(),
        source,
    })?;

    let entries = extract_entries(&html, &base, selector);
    info!(count = entries.len(), page = page_url, "Fetched entries");
    Ok(entries)
}

/// Extract entries from raw HTML, in document order.
///
/// An anchor contributes an entry only when both its `title` and `href`
/// attributes are present and non-empty. Relative hrefs are resolved
/// against `base`; anchors whose href cannot resolve are skipped. An
/// unparsable selector or a page without the container yields an empty
/// list, never an error.
pub fn extract_entries(html: &str, base: &Url, selector: &str) -> Vec<Entry> {
    let document = Html::parse_document(html);
    let anchor_selector = match Selector::parse(selector) {
        Ok(s) => s,
        Err(e) => {
            warn!(selector, error = %e, "Invalid anchor selector; treating page as empty");
            return Vec::new();
        }
    };

    let mut entries = Vec::new();
    for element in document.select(&anchor_selector) {
        let title = element.value().attr("title").unwrap_or_default();
        let href = element.value().attr("href").unwrap_or_default();
        if title.is_empty() || href.is_empty() {
            continue;
        }
        match base.join(href) {
            Ok(resolved) => entries.push(Entry::new(title, resolved.to_string())),
            Err(e) => warn!(href, error = %e, "Skipping anchor with unresolvable href"),
        }
    }

    debug!(count = entries.len(), "Extracted entries from document");
    entries
}
