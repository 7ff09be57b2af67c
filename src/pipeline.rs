//! The conversion run: read, sort, enrich, write.

use anyhow::{Context, Result};

use crate::config::Settings;
use crate::content::{self, EnrichReport};
use crate::feed;
use crate::output;

/// What a completed run did.
#[derive(Debug)]
pub struct ConvertSummary {
    pub feed_title: String,
    pub items: usize,
    pub enrichment: EnrichReport,
}

/// Converts the appcast at `settings.input` into JSON at `settings.output`.
///
/// Stages run strictly in order. Any error stops the run before the next
/// stage, so nothing is written unless every earlier stage succeeded.
pub async fn convert(settings: &Settings) -> Result<ConvertSummary> {
    tracing::info!(path = %settings.input.display(), "Reading feed");
    let document = feed::read_feed(&settings.input)
        .await
        .with_context(|| format!("Failed to load feed {}", settings.input.display()))?;

    let feed_title = document.channel.title;
    let mut items = document.channel.items;
    tracing::info!(title = %feed_title, items = items.len(), "Sorting items");
    feed::sort_by_short_version(&mut items);

    let client = settings
        .http_client()
        .context("Failed to build HTTP client")?;
    let enrichment = content::enrich(&client, &mut items, &settings.enrich_options())
        .await
        .context("Failed to fetch release notes")?;

    tracing::info!(path = %settings.output.display(), "Writing JSON");
    output::write_items(&items, &settings.output, &settings.json_options())
        .with_context(|| format!("Failed to write {}", settings.output.display()))?;

    Ok(ConvertSummary {
        feed_title,
        items: items.len(),
        enrichment,
    })
}
