//! File validation: decide whether a picked file may be submitted.
//!
//! The service accepts PDF result sheets and their plain-text exports. The
//! MIME check covers PDFs; the `.txt` suffix check is the fallback for
//! environments that report plain text under an unexpected MIME type. There
//! is no size limit.

use crate::error::INVALID_FILE_TYPE;
use std::fmt;
use std::sync::Arc;

/// MIME type accepted without looking at the name.
pub const PDF_MIME: &str = "application/pdf";

/// Filename suffix accepted regardless of MIME type. Case-sensitive.
pub const TEXT_SUFFIX: &str = ".txt";

/// A file the user picked, before validation.
#[derive(Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileCandidate {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

impl fmt::Debug for FileCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileCandidate")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

/// A file that passed validation and may be submitted.
///
/// The content is shared, so building a request from it does not copy the
/// document.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    mime_type: String,
    bytes: Arc<[u8]>,
}

impl SelectedFile {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Accepted(SelectedFile),
    Rejected(String),
}

/// `true` if a file with this name and MIME type may be submitted.
pub fn is_accepted_type(name: &str, mime_type: &str) -> bool {
    mime_type == PDF_MIME || name.ends_with(TEXT_SUFFIX)
}

/// Accept PDFs (by MIME type) and `.txt` files (by name); reject the rest.
pub fn validate(candidate: FileCandidate) -> Validation {
    if is_accepted_type(&candidate.name, &candidate.mime_type) {
        Validation::Accepted(SelectedFile {
            name: candidate.name,
            mime_type: candidate.mime_type,
            bytes: Arc::from(candidate.bytes),
        })
    } else {
        Validation::Rejected(INVALID_FILE_TYPE.to_string())
    }
}
