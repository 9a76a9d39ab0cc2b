//! Value types shared across the pipeline.
//!
//! The only durable concept in this program is the [`Entry`]: one news item
//! discovered on the listing page. Everything else is transient per-run
//! state.

/// One news item discovered on the listing page.
///
/// The `url` is the identity key: two entries refer to the same item iff
/// their URLs are byte-for-byte equal. Titles may legitimately change
/// between scrapes and never participate in deduplication.
///
/// Entries are immutable once constructed and live only for the duration of
/// a single run; the history store persists URLs, not entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Display title taken from the anchor's `title` attribute.
    pub title: String,
    /// Canonical item URL, resolved to absolute form at scrape time.
    pub url: String,
}

impl Entry {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}
