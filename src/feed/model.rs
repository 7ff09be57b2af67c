use serde::{Deserialize, Serialize};

/// A decoded Sparkle appcast.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedDocument {
    /// RSS `version` attribute on the root element.
    pub version: String,
    /// URI bound to the `sparkle` namespace prefix.
    pub sparkle_namespace: String,
    pub channel: Channel,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Channel {
    pub title: String,
    pub items: Vec<ReleaseItem>,
}

/// One published release.
///
/// JSON field names are PascalCase (`ShortVersionString`,
/// `ReleaseNotesLink`, ...), and the same names are read back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseItem {
    #[serde(rename = "Title", default)]
    pub title: String,

    /// Publication date, kept as the feed wrote it.
    #[serde(rename = "PubDate", default)]
    pub pub_date: String,

    /// Full (build) version, `sparkle:version`.
    #[serde(rename = "Version", default)]
    pub version: String,

    /// Marketing version, `sparkle:shortVersionString`. Drives ordering.
    #[serde(rename = "ShortVersionString", default)]
    pub short_version: String,

    /// Release notes. May be empty until enrichment fills it.
    #[serde(rename = "Description", default)]
    pub description: String,

    #[serde(rename = "MinimumSystemVersion", default)]
    pub minimum_system_version: String,

    #[serde(rename = "Enclosure", default)]
    pub enclosure: Enclosure,

    /// Delta patches. Passed through untouched; the JSON writer decides
    /// whether they are emitted.
    #[serde(skip)]
    pub deltas: Deltas,

    /// Page holding the release notes when `description` is empty.
    #[serde(rename = "ReleaseNotesLink", default)]
    pub release_notes_link: String,
}

impl ReleaseItem {
    /// True when the item has no inline notes but links to some.
    pub fn needs_release_notes(&self) -> bool {
        self.description.is_empty() && !self.release_notes_link.is_empty()
    }

    pub fn delta_updates(&self) -> &[DeltaUpdate] {
        &self.deltas.enclosures
    }
}

/// Full download of a release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enclosure {
    #[serde(rename = "URL", default)]
    pub url: String,
    /// Byte length as written in the feed.
    #[serde(rename = "Length", default)]
    pub length: String,
    #[serde(rename = "Type", default)]
    pub mime_type: String,
    #[serde(rename = "EdSignature", default)]
    pub ed_signature: String,
}

/// `<sparkle:deltas>` container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deltas {
    pub enclosures: Vec<DeltaUpdate>,
}

/// Patch that upgrades from `delta_from` to the enclosing release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaUpdate {
    #[serde(rename = "URL", default)]
    pub url: String,
    #[serde(rename = "DeltaFrom", default)]
    pub delta_from: String,
    #[serde(rename = "Length", default)]
    pub length: String,
    #[serde(rename = "Type", default)]
    pub mime_type: String,
    #[serde(rename = "EdSignature", default)]
    pub ed_signature: String,
    #[serde(rename = "Version", default)]
    pub version: String,
    #[serde(rename = "ShortVersionString", default)]
    pub short_version: String,
}
