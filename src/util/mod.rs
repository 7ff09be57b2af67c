//! Utility functions for common operations.
//!
//! - **Link validation**: check release-notes links before fetching them

mod url_validator;

pub use url_validator::{validate_link, LinkError};
