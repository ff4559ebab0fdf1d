//! Interpretation: turn a [`RawOutcome`] into a typed [`ConversionResult`].
//!
//! Pure and deterministic: the same outcome and context always give the same
//! result, so the workflow can be tested by feeding it canned outcomes.
//!
//! ## Filename resolution
//!
//! 1. `Content-Disposition` header (looked up case-insensitively), first
//!    capture of `filename="?([^"]+)"?`
//! 2. `{scheme}_{semester}_Results.xlsx` when both are known
//! 3. `converted_result.xlsx`
//!
//! ## Failure bodies
//!
//! A non-2xx body is decoded as `{"detail": "<message>"}`. A missing, blank
//! or non-string `detail`, or a body that is not JSON at all, falls back to
//! `Server Error (<status>)`. Decoding problems are logged and swallowed.

use crate::context::SubmissionContext;
use crate::error::ConversionFailure;
use crate::pipeline::client::RawOutcome;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION};
use serde::Deserialize;
use std::fmt;
use tracing::debug;

/// Typed result of one conversion attempt.
#[derive(Clone, PartialEq, Eq)]
pub enum ConversionResult {
    Success { filename: String, payload: Vec<u8> },
    Failure(ConversionFailure),
}

impl ConversionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The user-facing failure message, if this is a failure.
    pub fn failure_message(&self) -> Option<String> {
        match self {
            Self::Success { .. } => None,
            Self::Failure(f) => Some(f.message()),
        }
    }
}

impl fmt::Debug for ConversionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { filename, payload } => f
                .debug_struct("Success")
                .field("filename", filename)
                .field("payload", &format_args!("<{} bytes>", payload.len()))
                .finish(),
            Self::Failure(failure) => f.debug_tuple("Failure").field(failure).finish(),
        }
    }
}

/// Judge a raw outcome in the light of the submission context.
pub fn interpret(outcome: &RawOutcome, context: &SubmissionContext) -> ConversionResult {
    match outcome {
        RawOutcome::TransportFailure(cause) => ConversionResult::Failure(ConversionFailure::Transport {
            cause: cause.clone(),
        }),
        RawOutcome::Response {
            status,
            headers,
            body,
        } if (200..300).contains(status) => {
            let filename = filename_from_headers(headers).unwrap_or_else(|| {
                let fallback = context.fallback_filename();
                debug!("No filename in Content-Disposition, using '{}'", fallback);
                fallback
            });
            ConversionResult::Success {
                filename,
                payload: body.clone(),
            }
        }
        RawOutcome::Response { status, body, .. } => {
            ConversionResult::Failure(server_failure(*status, body))
        }
    }
}

// ── Content-Disposition ──────────────────────────────────────────────────────

static RE_FILENAME: Lazy<Regex> = Lazy::new(|| Regex::new(r#"filename="?([^"]+)"?"#).unwrap());

/// Extract the suggested filename from a `Content-Disposition` value.
pub fn filename_from_content_disposition(value: &str) -> Option<String> {
    RE_FILENAME
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn filename_from_headers(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_DISPOSITION)?.to_str().ok()?;
    let filename = filename_from_content_disposition(value);
    if filename.is_none() {
        debug!("Content-Disposition '{}' carries no filename", value);
    }
    filename
}

// ── Failure bodies ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

fn server_failure(status: u16, body: &[u8]) -> ConversionFailure {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: Some(detail),
        }) if !detail.trim().is_empty() => ConversionFailure::ServerDetail { status, detail },
        Ok(_) => ConversionFailure::ServerStatus { status },
        Err(e) => {
            debug!("HTTP {} body is not a detail object: {}", status, e);
            ConversionFailure::ServerStatus { status }
        }
    }
}
