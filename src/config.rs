//! Run settings for a conversion.
//!
//! Defaults reproduce the converter's historical fixed behavior: write
//! `mercury.json`, fetch one link at a time with no timeout, stop on the
//! first failure. The CLI overrides them from its flags.
use std::path::PathBuf;
use std::time::Duration;

use crate::content::{EnrichOptions, FailurePolicy};
use crate::output::JsonOptions;

/// Output file written when no `--output` is given.
pub const DEFAULT_OUTPUT: &str = "mercury.json";

#[derive(Debug, Clone)]
pub struct Settings {
    /// Appcast XML to read.
    pub input: PathBuf,

    /// JSON file to write.
    pub output: PathBuf,

    /// Per-request limit for release-notes fetches. `None` = no limit.
    pub request_timeout: Option<Duration>,

    /// Release-notes fetches allowed in flight at once.
    pub concurrency: usize,

    /// Abort on the first failed fetch, or record it and continue.
    pub failure_policy: FailurePolicy,

    /// Emit delta patches in the JSON.
    pub include_deltas: bool,

    /// Escape HTML-sensitive characters in JSON strings.
    pub escape_html: bool,
}

impl Settings {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            request_timeout: None,
            concurrency: 1,
            failure_policy: FailurePolicy::Abort,
            include_deltas: false,
            escape_html: true,
        }
    }

    pub fn enrich_options(&self) -> EnrichOptions {
        EnrichOptions {
            concurrency: self.concurrency.max(1),
            timeout: self.request_timeout,
            failure_policy: self.failure_policy,
        }
    }

    pub fn json_options(&self) -> JsonOptions {
        JsonOptions {
            include_deltas: self.include_deltas,
            escape_html: self.escape_html,
        }
    }

    /// HTTP client used for release-notes fetches.
    ///
    /// No default headers and reqwest's default redirect policy. The timeout
    /// is applied per request by the enricher, not here.
    pub fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder().build()
    }
}
