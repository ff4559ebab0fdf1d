//! Input resolution: turn a local path into a [`FileCandidate`].
//!
//! A browser hands over a name and a MIME type with every picked file. On the
//! command line only the path exists, so the MIME type is sniffed: `%PDF`
//! magic bytes win, then the extension, then `application/octet-stream`.
//! Validation happens afterwards in [`super::validate`], never here.

use crate::error::ConvertError;
use crate::pipeline::validate::{FileCandidate, PDF_MIME};
use std::path::Path;
use tracing::debug;

/// MIME type reported for `.txt` files.
pub const TEXT_MIME: &str = "text/plain";

/// MIME type reported when nothing else matches.
pub const OCTET_STREAM_MIME: &str = "application/octet-stream";

/// Guess a MIME type from the file name and leading bytes.
pub fn sniff_mime(name: &str, bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"%PDF") {
        return PDF_MIME;
    }
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => PDF_MIME,
        Some("txt") => TEXT_MIME,
        _ => OCTET_STREAM_MIME,
    }
}

/// Read a local file into a candidate.
///
/// `mime_override` replaces the sniffed type, for callers that already know
/// better (e.g. an upload form that reported one).
pub async fn load_candidate(
    path: impl AsRef<Path>,
    mime_override: Option<&str>,
) -> Result<FileCandidate, ConvertError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConvertError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => ConvertError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ConvertError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let name = display_name(path);
    let mime_type = match mime_override {
        Some(m) => m.to_string(),
        None => sniff_mime(&name, &bytes).to_string(),
    };

    debug!(
        "Loaded '{}' ({} bytes, {})",
        path.display(),
        bytes.len(),
        mime_type
    );
    Ok(FileCandidate::new(name, mime_type, bytes))
}

/// The file name as the service should see it: the last path component.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
