use thiserror::Error;
use url::Url;

/// Errors that can occur when validating a release-notes link.
#[derive(Error, Debug)]
pub enum LinkError {
    /// The link could not be parsed as an absolute URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The link uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
}

/// Validates a release-notes link before it is fetched.
///
/// Surrounding whitespace is trimmed, since appcasts are often hand-edited
/// and wrap the link text onto its own line. Only `http` and `https` links
/// are accepted. Unlike a subscription URL, a release-notes link
/// may point at a private or loopback host: it comes from the same feed the
/// user chose to convert.
///
/// # Examples
///
/// ```
/// use sparkle_json::util::validate_link;
///
/// let url = validate_link("https://example.com/notes/2.0.html").unwrap();
/// assert_eq!(url.host_str(), Some("example.com"));
///
/// assert!(validate_link("file:///etc/passwd").is_err());
/// assert!(validate_link("notes.html").is_err());
/// ```
pub fn validate_link(link: &str) -> Result<Url, LinkError> {
    let url = Url::parse(link.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(LinkError::UnsupportedScheme(scheme.to_owned())),
    }

    Ok(url)
}
