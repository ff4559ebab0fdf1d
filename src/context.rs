//! Scheme/semester selection carried alongside a submission.
//!
//! The selection comes from whatever front end drives the workflow (the CLI
//! flags, or a routing layer in a UI). The core only checks presence: the
//! values are forwarded to the service and used to derive the fallback
//! spreadsheet name.

use serde::{Deserialize, Serialize};

/// Curriculum schemes offered by the selection surface.
pub const SCHEMES: [&str; 2] = ["2024", "2019"];

/// Semester labels offered by the selection surface.
pub const SEMESTERS: [&str; 8] = ["S1", "S2", "S3", "S4", "S5", "S6", "S7", "S8"];

/// Default download name when no context is available.
pub const DEFAULT_FILENAME: &str = "converted_result.xlsx";

/// Optional scheme/semester selection for a workflow instance.
///
/// An empty context is the context-free deployment: no extra multipart
/// fields are sent and the fallback filename is [`DEFAULT_FILENAME`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionContext {
    pub scheme: Option<String>,
    pub semester: Option<String>,
}

impl SubmissionContext {
    /// Context with both a scheme and a semester selected.
    pub fn new(scheme: impl Into<String>, semester: impl Into<String>) -> Self {
        Self {
            scheme: Some(scheme.into()),
            semester: Some(semester.into()),
        }
    }

    /// `true` when neither value is set.
    pub fn is_empty(&self) -> bool {
        self.scheme.is_none() && self.semester.is_none()
    }

    /// Filename used when the service does not suggest one.
    pub fn fallback_filename(&self) -> String {
        match (self.scheme.as_deref(), self.semester.as_deref()) {
            (Some(scheme), Some(semester)) => format!("{scheme}_{semester}_Results.xlsx"),
            _ => DEFAULT_FILENAME.to_string(),
        }
    }

    /// Human-readable label, e.g. `"2024 Scheme · S3"`.
    pub fn label(&self) -> Option<String> {
        match (self.scheme.as_deref(), self.semester.as_deref()) {
            (Some(scheme), Some(semester)) => Some(format!("{scheme} Scheme · {semester}")),
            (Some(scheme), None) => Some(format!("{scheme} Scheme")),
            (None, Some(semester)) => Some(semester.to_string()),
            (None, None) => None,
        }
    }
}
