//! Output types for one-shot conversions.

use crate::context::SubmissionContext;
use crate::error::ConvertError;
use crate::workflow::WorkflowStatus;
use serde::Serialize;
use std::path::PathBuf;

/// What happened to one document run through [`crate::convert::convert_file`].
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    /// Name of the uploaded document.
    pub file_name: String,
    /// Scheme/semester the upload was tagged with.
    pub context: SubmissionContext,
    /// Final workflow status: `succeeded` or `failed`.
    pub status: WorkflowStatus,
    /// Display message of the final status.
    pub message: String,
    /// Where the spreadsheet was saved, on success.
    pub saved_to: Option<PathBuf>,
    /// Wall-clock time from submission to saved file (or failure).
    pub duration_ms: u64,
}

impl ConversionReport {
    pub fn is_success(&self) -> bool {
        self.status == WorkflowStatus::Succeeded
    }

    /// Convert a failed run into an error, for callers that want `?`.
    pub fn into_result(self) -> Result<Self, ConvertError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ConvertError::ConversionFailed {
                message: self.message,
            })
        }
    }
}
