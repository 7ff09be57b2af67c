//! Convert a Sparkle appcast into JSON.
//!
//! Items are sorted newest first by `shortVersionString`; items without
//! inline notes get the body of their `releaseNotesLink` as description.

pub mod config;
pub mod content;
pub mod error;
pub mod feed;
pub mod output;
pub mod pipeline;
pub mod util;

pub use config::Settings;
pub use error::FailureKind;
pub use pipeline::{convert, ConvertSummary};
