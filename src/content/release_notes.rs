use std::pin::pin;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use thiserror::Error;
use url::Url;

use crate::feed::ReleaseItem;
use crate::util::{validate_link, LinkError};

/// Errors that can occur while fetching release notes.
#[derive(Debug, Error)]
pub enum NotesError {
    /// Link is not an absolute http(s) URL.
    #[error("Invalid release notes link '{link}': {source}")]
    InvalidLink {
        link: String,
        #[source]
        source: LinkError,
    },
    /// Transport failure while connecting or reading the body.
    #[error("Request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// Request exceeded the configured limit.
    #[error("Request to {url} timed out after {}s", .limit.as_secs_f64())]
    Timeout { url: String, limit: Duration },
}

/// What to do when one item's release notes cannot be fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failure. Nothing after it is fetched.
    #[default]
    Abort,
    /// Record the failure, leave that description empty and carry on.
    Continue,
}

#[derive(Debug, Clone)]
pub struct EnrichOptions {
    /// Maximum fetches in flight. 1 fetches strictly one after another.
    pub concurrency: usize,
    /// Per-request limit covering connect and body. `None` waits forever.
    pub timeout: Option<Duration>,
    pub failure_policy: FailurePolicy,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            timeout: None,
            failure_policy: FailurePolicy::Abort,
        }
    }
}

/// An item whose notes could not be fetched under [`FailurePolicy::Continue`].
#[derive(Debug)]
pub struct NoteFailure {
    /// Zero-based position in the sorted item list.
    pub position: usize,
    pub title: String,
    pub error: NotesError,
}

/// Outcome of an enrichment pass.
#[derive(Debug, Default)]
pub struct EnrichReport {
    /// Items whose description now holds a fetched body.
    pub fetched: usize,
    /// Items that already had notes, or had no link to fetch.
    pub skipped: usize,
    pub failures: Vec<NoteFailure>,
}

/// Fills empty descriptions from each item's release-notes link.
///
/// Only items with an empty `description` and a non-empty
/// `release_notes_link` are fetched; inline notes always win. Results are
/// applied in item order regardless of `concurrency`, so the output does not
/// depend on which request finishes first.
///
/// # Errors
///
/// Under [`FailurePolicy::Abort`] the first failing item, in item order, is
/// returned and no later item is touched. Under
/// [`FailurePolicy::Continue`] this never errors; failures are listed in the
/// report.
pub async fn enrich(
    client: &reqwest::Client,
    items: &mut [ReleaseItem],
    options: &EnrichOptions,
) -> Result<EnrichReport, NotesError> {
    let total = items.len();
    let pending: Vec<(usize, String, String)> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.needs_release_notes())
        .map(|(position, item)| {
            (
                position,
                item.title.clone(),
                item.release_notes_link.clone(),
            )
        })
        .collect();

    let mut report = EnrichReport {
        skipped: total - pending.len(),
        ..Default::default()
    };

    if pending.is_empty() {
        tracing::debug!(total = total, "No items need release notes");
        return Ok(report);
    }

    let timeout = options.timeout;
    let mut results = pin!(stream::iter(pending)
        .map(move |(position, title, link)| async move {
            tracing::info!(
                title = %title,
                position = position + 1,
                total = total,
                "Fetching release notes"
            );
            let result = fetch_release_notes(client, &link, timeout).await;
            (position, title, result)
        })
        .buffered(options.concurrency.max(1)));

    while let Some((position, title, result)) = results.next().await {
        match result {
            Ok(notes) => {
                tracing::debug!(title = %title, bytes = notes.len(), "Stored release notes");
                items[position].description = notes;
                report.fetched += 1;
            }
            Err(error) => match options.failure_policy {
                FailurePolicy::Abort => return Err(error),
                FailurePolicy::Continue => {
                    tracing::warn!(
                        title = %title,
                        position = position + 1,
                        error = %error,
                        "Failed to fetch release notes, leaving description empty"
                    );
                    report.failures.push(NoteFailure {
                        position,
                        title,
                        error,
                    });
                }
            },
        }
    }

    Ok(report)
}

/// GETs `link` and returns the body as text.
///
/// The body is stored as served: no trimming, no sanitizing. Bytes that are
/// not UTF-8 are replaced with U+FFFD. A non-2xx status is not an error; its
/// body is returned like any other.
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `link` - The item's `releaseNotesLink`, surrounding whitespace allowed
/// * `timeout` - Limit for the whole request, body included. `None` waits
///   indefinitely
///
/// # Errors
///
/// Returns an error if:
/// - `link` is not an absolute http(s) URL ([`NotesError::InvalidLink`])
/// - The connection or body transfer fails ([`NotesError::Network`])
/// - The limit in `timeout` expires ([`NotesError::Timeout`])
pub async fn fetch_release_notes(
    client: &reqwest::Client,
    link: &str,
    timeout: Option<Duration>,
) -> Result<String, NotesError> {
    let url = validate_link(link).map_err(|source| NotesError::InvalidLink {
        link: link.to_string(),
        source,
    })?;

    match timeout {
        Some(limit) => {
            let target = url.to_string();
            tokio::time::timeout(limit, download(client, url))
                .await
                .map_err(|_| NotesError::Timeout { url: target, limit })?
        }
        None => download(client, url).await,
    }
}

async fn download(client: &reqwest::Client, url: Url) -> Result<String, NotesError> {
    let network = |source| NotesError::Network {
        url: url.to_string(),
        source,
    };

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(network)?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(
            url = %url,
            status = status.as_u16(),
            "Release notes link returned non-success status, keeping body"
        );
    }

    let body = response.bytes().await.map_err(network)?;
    Ok(String::from_utf8_lossy(&body).into_owned())
}
