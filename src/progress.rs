//! Status-callback trait for the presentation layer.
//!
//! Inject an [`Arc<dyn WorkflowStatusCallback>`] via
//! [`crate::config::ConverterConfigBuilder::status_callback`] to be told
//! about every workflow status change, the upload as it goes out, and the
//! saved spreadsheet.
//!
//! # Example
//!
//! ```rust
//! use result2xlsx::{ConverterConfig, WorkflowStatus, WorkflowStatusCallback};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct History(Mutex<Vec<WorkflowStatus>>);
//!
//! impl WorkflowStatusCallback for History {
//!     fn on_status_change(&self, status: WorkflowStatus, _message: &str) {
//!         self.0.lock().unwrap().push(status);
//!     }
//! }
//!
//! let config = ConverterConfig::builder()
//!     .status_callback(Arc::new(History::default()) as Arc<dyn WorkflowStatusCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::pipeline::client::ConversionRequest;
use crate::workflow::WorkflowStatus;
use std::path::Path;
use std::sync::Arc;

/// Called by [`crate::workflow::WorkflowDriver`] as the workflow moves.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait WorkflowStatusCallback: Send + Sync {
    /// Called after every transition that changed the status or its message.
    ///
    /// # Arguments
    /// * `status`  — the status now active
    /// * `message` — its display message (empty for `Idle`/`Ready`)
    fn on_status_change(&self, status: WorkflowStatus, message: &str) {
        let _ = (status, message);
    }

    /// Called just before the upload is sent.
    fn on_submit(&self, request: &ConversionRequest) {
        let _ = request;
    }

    /// Called once the spreadsheet has been saved.
    ///
    /// # Arguments
    /// * `path`  — where the file was written
    /// * `bytes` — payload size
    fn on_download(&self, path: &Path, bytes: usize) {
        let _ = (path, bytes);
    }
}

/// A no-op implementation for callers that don't need status events.
pub struct NoopStatusCallback;

impl WorkflowStatusCallback for NoopStatusCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConverterConfig`].
pub type StatusCallback = Arc<dyn WorkflowStatusCallback>;
