use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use thiserror::Error;

use super::formatter::HtmlSafeFormatter;
use crate::feed::{DeltaUpdate, ReleaseItem};

const INDENT: &[u8] = b"  ";

/// Errors that can occur while writing the JSON output.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize items: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to create temporary file '{}': {source}", .path.display())]
    CreateTemp {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to rename '{}' to '{}': {source}", .from.display(), .to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct JsonOptions {
    /// Emit each item's delta patches as a `Deltas` array.
    pub include_deltas: bool,
    /// Escape `<`, `>` and `&` in strings (see [`HtmlSafeFormatter`]).
    pub escape_html: bool,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self {
            include_deltas: false,
            escape_html: true,
        }
    }
}

#[derive(Serialize)]
struct ItemRecord<'a> {
    #[serde(flatten)]
    item: &'a ReleaseItem,
    #[serde(rename = "Deltas", skip_serializing_if = "Option::is_none")]
    deltas: Option<&'a [DeltaUpdate]>,
}

/// Renders `items` as a two-space indented JSON array with a trailing newline.
///
/// # Errors
///
/// Returns [`OutputError::Serialize`] if serialization fails.
pub fn render_items(items: &[ReleaseItem], options: &JsonOptions) -> Result<Vec<u8>, OutputError> {
    let records: Vec<ItemRecord<'_>> = items
        .iter()
        .map(|item| ItemRecord {
            item,
            deltas: options.include_deltas.then(|| item.delta_updates()),
        })
        .collect();

    let mut buf = Vec::new();
    if options.escape_html {
        let formatter = HtmlSafeFormatter::with_indent(INDENT);
        records.serialize(&mut serde_json::Serializer::with_formatter(&mut buf, formatter))?;
    } else {
        let formatter = PrettyFormatter::with_indent(INDENT);
        records.serialize(&mut serde_json::Serializer::with_formatter(&mut buf, formatter))?;
    }
    buf.push(b'\n');
    Ok(buf)
}

/// Writes `items` to `path` atomically.
///
/// The JSON goes to a temporary file next to `path`, is synced, then renamed
/// over the destination, so an existing file is either fully replaced or left
/// as it was.
///
/// # Arguments
///
/// * `items` - Release items, already in output order
/// * `path` - Destination file; its parent directory must exist
/// * `options` - Delta and escaping switches
///
/// # Errors
///
/// Returns an error if:
/// - The temporary file cannot be created ([`OutputError::CreateTemp`])
/// - Writing or syncing it fails ([`OutputError::Write`])
/// - It cannot be renamed over `path` ([`OutputError::Rename`])
///
/// The temporary file is removed on every failure path.
pub fn write_items(
    items: &[ReleaseItem],
    path: &Path,
    options: &JsonOptions,
) -> Result<(), OutputError> {
    use std::time::{SystemTime, UNIX_EPOCH};

    let content = render_items(items, options)?;

    // SEC-009: Randomized temp filename to prevent TOCTOU race conditions
    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = path.with_extension(format!("tmp.{:016x}", random_suffix));

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .map_err(|source| OutputError::CreateTemp {
            path: temp_path.clone(),
            source,
        })?;

    let written = std::io::Write::write_all(&mut file, &content).and_then(|()| file.sync_all());
    drop(file);
    if let Err(source) = written {
        let _ = std::fs::remove_file(&temp_path);
        return Err(OutputError::Write {
            path: temp_path,
            source,
        });
    }

    // On Windows, rename fails if destination exists
    #[cfg(windows)]
    if path.exists() {
        if let Err(source) = std::fs::remove_file(path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(OutputError::Write {
                path: path.to_path_buf(),
                source,
            });
        }
    }

    if let Err(source) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(OutputError::Rename {
            from: temp_path,
            to: path.to_path_buf(),
            source,
        });
    }

    tracing::debug!(path = %path.display(), bytes = content.len(), "Wrote JSON output");
    Ok(())
}
