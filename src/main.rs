//! # feedpost
//!
//! A one-shot content-syndication bot: scrape a fixed news-listing page,
//! work out which items have not yet been posted to the social feed, post
//! the new ones oldest-first, and record them in an append-only history
//! file.
//!
//! ## Usage
//!
//! ```sh
//! FEEDPOST_BEARER_TOKEN=... feedpost --page-url https://example.edu/whatsnew/
//! ```
//!
//! ## Architecture
//!
//! A single synchronous pipeline, run once per invocation:
//! 1. **Fetch**: GET the listing page and extract `title`/`href` anchor pairs
//! 2. **Dedup**: drop every entry whose URL is already in the history file
//! 3. **Order**: reverse to oldest-first so the feed reads chronologically
//! 4. **Publish**: compose, sanitize, and post each message
//! 5. **Commit**: append the published URLs to the history file
//!
//! All failure policy lives here: library modules return errors, and this
//! orchestrator decides what is fatal, what degrades, and what is escalated
//! to the alerting webhook.

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod error;
mod history;
mod models;
mod notify;
mod pipeline;
mod post;
mod scrape;

use cli::Cli;
use error::BotError;
use history::HistoryStore;
use notify::WebhookNotifier;
use pipeline::RunOptions;
use post::ApiPublisher;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("feedpost starting up");

    let args = Cli::parse();
    debug!(?args.page_url, ?args.dry_run, ?args.commit_policy, "Parsed CLI arguments");

    // Pre-flight: refuse to do anything without credentials, unless the run
    // never transmits.
    if args.bearer_token.is_none() && !args.dry_run {
        let err = BotError::MissingCredentials;
        error!(error = %err, "Refusing to start");
        return Err(err.into());
    }

    // One shared client so fetch, publish, and notify all carry the same
    // bounded timeout. A hung endpoint must not hang the cron slot forever.
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()?;

    let store = HistoryStore::new(args.save_file());
    let seen = match store.load().await {
        Ok(seen) => seen,
        Err(e) => {
            error!(error = %e, "Failed to load history");
            return Err(e.into());
        }
    };

    let fetched = match scrape::fetch_entries(&client, &args.page_url, &args.selector).await {
        Ok(fetched) => fetched,
        Err(e) => {
            error!(error = %e, "Fetch failed; history untouched");
            return Err(e.into());
        }
    };
    println!("Fetched entries: {}", fetched.len());

    let mut new_entries = pipeline::not_yet_posted(fetched, &seen);
    println!("New entries:     {}", new_entries.len());
    pipeline::oldest_first(&mut new_entries);

    let publisher = ApiPublisher::new(
        client.clone(),
        args.post_endpoint.clone(),
        args.bearer_token.clone().unwrap_or_default(),
    );
    let notifier = args
        .webhook_url
        .as_ref()
        .map(|url| WebhookNotifier::new(client.clone(), url.clone()));

    let opts = RunOptions {
        dry_run: args.dry_run,
        commit_policy: args.commit_policy,
        prefix: args.prefix.clone(),
        suffix: args.suffix.clone(),
    };

    let summary = match pipeline::run(&publisher, notifier.as_ref(), &store, new_entries, &opts).await
    {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "Run aborted");
            return Err(e.into());
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        published = summary.published,
        committed = summary.committed,
        ?elapsed,
        "Execution complete"
    );

    Ok(())
}
