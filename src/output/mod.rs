//! JSON output for the converted item list.
//!
//! - [`json`] - Rendering and atomic file writes
//! - [`formatter`] - HTML-safe pretty printer for `serde_json`

mod formatter;
mod json;

pub use formatter::HtmlSafeFormatter;
pub use json::{render_items, write_items, JsonOptions, OutputError};
