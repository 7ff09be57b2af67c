use std::path::{Path, PathBuf};

use quick_xml::escape::EscapeError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use super::model::{Channel, DeltaUpdate, Enclosure, FeedDocument, ReleaseItem};

/// Root element every appcast must have.
const ROOT_ELEMENT: &[u8] = b"rss";

/// Errors that can occur while loading an appcast.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The feed file could not be opened or read.
    #[error("Failed to read feed file '{}': {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Feed is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::str::Utf8Error),

    #[error("Feed has no root element")]
    MissingRoot,

    /// The document is XML but not an RSS appcast.
    #[error("Expected root element <rss> but found <{0}>")]
    UnexpectedRoot(String),

    /// XML is not well-formed.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Text or attribute holds an entity that is not one of the XML builtins.
    #[error("Failed to unescape feed text: {0}")]
    Escape(#[from] EscapeError),

    /// The document stopped before an open element was closed.
    #[error("Feed ended inside <{0}>")]
    Truncated(String),
}

impl FeedError {
    /// True for every failure that happened after the file was read.
    pub fn is_parse_error(&self) -> bool {
        !matches!(self, FeedError::Open { .. })
    }
}

/// Reads and decodes the appcast at `path`.
///
/// The whole file is read before decoding starts; nothing is returned unless
/// the complete document decodes.
///
/// # Arguments
///
/// * `path` - Filesystem path to the appcast XML
///
/// # Errors
///
/// Returns [`FeedError::Open`] if the file cannot be read, and any of the
/// other variants if its content is not a well-formed `<rss>` document.
pub async fn read_feed(path: &Path) -> Result<FeedDocument, FeedError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| FeedError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Read feed file");
    parse_feed_bytes(&bytes)
}

/// Decodes appcast XML held in raw bytes.
///
/// # Errors
///
/// Returns [`FeedError::NotUtf8`] if `bytes` is not UTF-8, otherwise whatever
/// [`parse_feed`] returns.
pub fn parse_feed_bytes(bytes: &[u8]) -> Result<FeedDocument, FeedError> {
    let content = std::str::from_utf8(bytes)?;
    parse_feed(content)
}

/// Decodes appcast XML.
///
/// Elements and attributes are matched by local name, so `sparkle:version`
/// and `version` are the same field. Unknown elements and attributes are
/// skipped. Text is kept exactly as written, surrounding whitespace
/// included. Markup nested inside a text field is skipped and only the
/// field's own text is kept. When a field appears more than once the last
/// occurrence wins; a repeated `<enclosure>` overrides only the attributes
/// it carries.
///
/// # Errors
///
/// Returns [`FeedError::MissingRoot`] or [`FeedError::UnexpectedRoot`] if the
/// document element is not `<rss>`, and [`FeedError::Xml`],
/// [`FeedError::Escape`] or [`FeedError::Truncated`] if the XML is not
/// well-formed. No partial document is returned.
///
/// # Security
///
/// SEC-002: quick-xml (0.37) never parses `<!ENTITY>` declarations. Text and
/// attributes are unescaped with the builtin entity table only, so custom
/// entities like `&xxe;` fail with an unrecognized-entity error instead of
/// resolving to file contents.
pub fn parse_feed(content: &str) -> Result<FeedDocument, FeedError> {
    let mut reader = Reader::from_str(content);
    // Whitespace is significant: a blank description is not an empty one.
    reader.config_mut().trim_text(false);

    let document = loop {
        match reader.read_event()? {
            Event::Start(e) => {
                check_root(&e)?;
                let mut document = root_attributes(&reader, &e)?;
                read_root(&mut reader, &mut document)?;
                break document;
            }
            Event::Empty(e) => {
                check_root(&e)?;
                break root_attributes(&reader, &e)?;
            }
            Event::Eof => return Err(FeedError::MissingRoot),
            _ => {}
        }
    };

    tracing::debug!(
        title = %document.channel.title,
        items = document.channel.items.len(),
        "Decoded feed"
    );
    Ok(document)
}

fn check_root(e: &BytesStart<'_>) -> Result<(), FeedError> {
    let name = e.local_name();
    if name.as_ref() == ROOT_ELEMENT {
        return Ok(());
    }
    Err(FeedError::UnexpectedRoot(
        String::from_utf8_lossy(name.as_ref()).into_owned(),
    ))
}

fn root_attributes(
    reader: &Reader<&[u8]>,
    e: &BytesStart<'_>,
) -> Result<FeedDocument, FeedError> {
    let mut document = FeedDocument::default();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        match attr.key.local_name().as_ref() {
            b"version" => document.version = attr_value(reader, &attr)?,
            // `xmlns:sparkle`
            b"sparkle" => document.sparkle_namespace = attr_value(reader, &attr)?,
            _ => {}
        }
    }
    Ok(document)
}

fn read_root(
    reader: &mut Reader<&[u8]>,
    document: &mut FeedDocument,
) -> Result<(), FeedError> {
    read_children(reader, "rss", |reader, e, empty| {
        match (e.local_name().as_ref(), empty) {
            (b"channel", false) => read_channel(reader, &mut document.channel),
            (_, false) => skip(reader, &e),
            (_, true) => Ok(()),
        }
    })
}

/// Fills `channel` from one `<channel>` element. A second `<channel>` adds
/// to the same value.
fn read_channel(reader: &mut Reader<&[u8]>, channel: &mut Channel) -> Result<(), FeedError> {
    read_children(reader, "channel", |reader, e, empty| {
        match e.local_name().as_ref() {
            b"title" => channel.title = read_text(reader, &e, empty)?,
            b"item" => {
                let mut item = ReleaseItem::default();
                if !empty {
                    read_item(reader, &mut item)?;
                }
                channel.items.push(item);
            }
            _ if !empty => skip(reader, &e)?,
            _ => {}
        }
        Ok(())
    })
}

fn read_item(reader: &mut Reader<&[u8]>, item: &mut ReleaseItem) -> Result<(), FeedError> {
    read_children(reader, "item", |reader, e, empty| {
        match e.local_name().as_ref() {
            b"title" => item.title = read_text(reader, &e, empty)?,
            b"pubDate" => item.pub_date = read_text(reader, &e, empty)?,
            b"version" => item.version = read_text(reader, &e, empty)?,
            b"shortVersionString" => item.short_version = read_text(reader, &e, empty)?,
            b"description" => item.description = read_text(reader, &e, empty)?,
            b"minimumSystemVersion" => {
                item.minimum_system_version = read_text(reader, &e, empty)?
            }
            b"releaseNotesLink" => item.release_notes_link = read_text(reader, &e, empty)?,
            b"enclosure" => {
                enclosure_attributes(reader, &e, &mut item.enclosure)?;
                if !empty {
                    skip(reader, &e)?;
                }
            }
            b"deltas" if !empty => read_deltas(reader, &mut item.deltas.enclosures)?,
            _ if !empty => skip(reader, &e)?,
            _ => {}
        }
        Ok(())
    })
}

fn read_deltas(
    reader: &mut Reader<&[u8]>,
    deltas: &mut Vec<DeltaUpdate>,
) -> Result<(), FeedError> {
    read_children(reader, "deltas", |reader, e, empty| {
        if e.local_name().as_ref() == b"enclosure" {
            deltas.push(delta_attributes(reader, &e)?);
        }
        if !empty {
            skip(reader, &e)?;
        }
        Ok(())
    })
}

fn enclosure_attributes(
    reader: &Reader<&[u8]>,
    e: &BytesStart<'_>,
    enclosure: &mut Enclosure,
) -> Result<(), FeedError> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        match attr.key.local_name().as_ref() {
            b"url" => enclosure.url = attr_value(reader, &attr)?,
            b"length" => enclosure.length = attr_value(reader, &attr)?,
            b"type" => enclosure.mime_type = attr_value(reader, &attr)?,
            b"edSignature" => enclosure.ed_signature = attr_value(reader, &attr)?,
            _ => {}
        }
    }
    Ok(())
}

fn delta_attributes(
    reader: &Reader<&[u8]>,
    e: &BytesStart<'_>,
) -> Result<DeltaUpdate, FeedError> {
    let mut delta = DeltaUpdate::default();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        match attr.key.local_name().as_ref() {
            b"url" => delta.url = attr_value(reader, &attr)?,
            b"deltaFrom" => delta.delta_from = attr_value(reader, &attr)?,
            b"length" => delta.length = attr_value(reader, &attr)?,
            b"type" => delta.mime_type = attr_value(reader, &attr)?,
            b"edSignature" => delta.ed_signature = attr_value(reader, &attr)?,
            b"version" => delta.version = attr_value(reader, &attr)?,
            b"shortVersionString" => delta.short_version = attr_value(reader, &attr)?,
            _ => {}
        }
    }
    Ok(delta)
}

fn attr_value(
    reader: &Reader<&[u8]>,
    attr: &quick_xml::events::attributes::Attribute<'_>,
) -> Result<String, FeedError> {
    Ok(attr.decode_and_unescape_value(reader.decoder())?.into_owned())
}

/// Walks the children of the element named `parent` until its end tag.
///
/// `on_child` gets each child start tag and whether it was self-closing. For
/// a non-empty child it must consume everything up to the child's end tag.
fn read_children<'a, F>(
    reader: &mut Reader<&'a [u8]>,
    parent: &str,
    mut on_child: F,
) -> Result<(), FeedError>
where
    F: FnMut(&mut Reader<&'a [u8]>, BytesStart<'a>, bool) -> Result<(), FeedError>,
{
    loop {
        match reader.read_event()? {
            Event::Start(e) => on_child(reader, e, false)?,
            Event::Empty(e) => on_child(reader, e, true)?,
            Event::End(_) => return Ok(()),
            Event::Eof => return Err(FeedError::Truncated(parent.to_string())),
            _ => {}
        }
    }
}

/// Collects the direct text of an element, CDATA included, without trimming.
/// Child elements and their text are skipped.
fn read_text<'a>(
    reader: &mut Reader<&'a [u8]>,
    start: &BytesStart<'a>,
    empty: bool,
) -> Result<String, FeedError> {
    let mut text = String::new();
    if empty {
        return Ok(text);
    }
    loop {
        match reader.read_event()? {
            Event::Text(t) => {
                let raw = std::str::from_utf8(&t)?;
                text.push_str(&quick_xml::escape::unescape(raw)?);
            }
            Event::CData(c) => text.push_str(std::str::from_utf8(&c)?),
            Event::Start(e) => skip(reader, &e)?,
            Event::End(_) => return Ok(text),
            Event::Eof => {
                return Err(FeedError::Truncated(
                    String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
                ))
            }
            _ => {}
        }
    }
}

fn skip<'a>(reader: &mut Reader<&'a [u8]>, start: &BytesStart<'a>) -> Result<(), FeedError> {
    reader.read_to_end(start.name())?;
    Ok(())
}
