//! Sparkle appcast decoding and ordering.
//!
//! - [`reader`] - Decode appcast XML with the `quick-xml` pull reader
//! - [`sort`] - Newest-first ordering by `shortVersionString`
//! - [`model`] - The decoded document and its release items
//!
//! # Example
//!
//! ```ignore
//! use sparkle_json::feed::{read_feed, sort_by_short_version};
//!
//! let document = read_feed(Path::new("appcast.xml")).await?;
//! let mut items = document.channel.items;
//! sort_by_short_version(&mut items);
//! ```

mod model;
mod reader;
mod sort;

pub use model::{Channel, DeltaUpdate, Deltas, Enclosure, FeedDocument, ReleaseItem};
pub use reader::{parse_feed, parse_feed_bytes, read_feed, FeedError};
pub use sort::{sort_by_short_version, version_key};
