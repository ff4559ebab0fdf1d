//! Error types for the result2xlsx library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ConvertError`] — **Fatal**: the library cannot do its job at all
//!   (input file unreadable, endpoint misconfigured, spreadsheet could not be
//!   written). Returned as `Err(ConvertError)` from the top-level `convert*`
//!   functions and from [`crate::workflow::WorkflowDriver`].
//!
//! * [`ConversionFailure`] — **Non-fatal**: one conversion attempt failed
//!   (wrong file type, service unreachable, service rejected the document).
//!   Carried inside [`crate::pipeline::interpret::ConversionResult::Failure`]
//!   and surfaced as the `Failed` workflow status. The user can always try
//!   again by picking another file.
//!
//! The `Display` text of a [`ConversionFailure`] is the exact message shown
//! to the user, so it never includes internal causes.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the result2xlsx library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Result document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but reading it failed part-way.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Base URL and endpoint path do not form a usable HTTP(S) URL.
    #[error("Invalid conversion endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the downloaded spreadsheet.
    #[error("Failed to write spreadsheet '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Outcome errors ────────────────────────────────────────────────────
    /// The workflow ended in the `Failed` status.
    ///
    /// Returned by [`crate::output::ConversionReport::into_result`] when the
    /// caller wants to treat a failed conversion as an error.
    #[error("Conversion failed: {message}")]
    ConversionFailed { message: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Generic message for transport failures. The underlying cause is logged,
/// never displayed.
pub const NETWORK_ERROR_MESSAGE: &str = "network error — remote service unreachable";

/// Rejection reason for files that are neither PDF nor plain text.
pub const INVALID_FILE_TYPE: &str = "invalid file type";

/// A non-fatal failure of a single conversion attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversionFailure {
    /// The selected file was rejected locally and never submitted.
    #[error("{reason}")]
    Rejected { reason: String },

    /// The request could not reach the conversion service.
    #[error("network error — remote service unreachable")]
    Transport {
        #[serde(skip)]
        cause: String,
    },

    /// The service answered with a failure status and a `detail` message.
    #[error("{detail}")]
    ServerDetail { status: u16, detail: String },

    /// The service answered with a failure status and no usable body.
    #[error("Server Error ({status})")]
    ServerStatus { status: u16 },
}

impl ConversionFailure {
    /// The user-facing message for this failure.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// `true` when the failure happened before any request was sent.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}
