//! # result2xlsx
//!
//! Upload a semester result document (PDF or plain text) to a conversion
//! service and save the spreadsheet it generates.
//!
//! The service does the heavy lifting (parsing the result sheet, computing
//! SGPA, building the `.xlsx`). This crate is the client side of that
//! exchange: it decides which files may be sent, performs the upload, makes
//! sense of whatever comes back, and tracks a small user-visible status
//! machine while doing so.
//!
//! ## Workflow Overview
//!
//! ```text
//! document
//!  │
//!  ├─ 1. Validate   PDF by MIME type, or *.txt by name
//!  ├─ 2. Upload     multipart POST: file [+ scheme, semester]
//!  ├─ 3. Interpret  2xx → spreadsheet + filename, else error message
//!  └─ 4. Download   save as Content-Disposition name or {scheme}_{semester}_Results.xlsx
//!
//! status: Idle → Ready → Submitting → Succeeded | Failed
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use result2xlsx::{convert_file, ConverterConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConverterConfig::builder()
//!         .base_url("http://localhost:8000")
//!         .scheme("2019")
//!         .semester("S5")
//!         .output_dir("sheets")
//!         .build()?;
//!     let report = convert_file("results.pdf", &config).await?;
//!     println!("{}: {}", report.status, report.message);
//!     Ok(())
//! }
//! ```
//!
//! ## Driving the state machine yourself
//!
//! UI front ends feed [`WorkflowMessage`]s to a [`ConversionWorkflow`] and
//! execute the [`WorkflowCommand`]s it hands back, or let a
//! [`WorkflowDriver`] do that with any [`ConversionTransport`] and
//! [`DownloadTrigger`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `result2xlsx` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod context;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConverterConfig, ConverterConfigBuilder};
pub use context::{SubmissionContext, SCHEMES, SEMESTERS};
pub use convert::{convert_bytes, convert_file, convert_sync, driver_from_config};
pub use error::{ConversionFailure, ConvertError};
pub use output::ConversionReport;
pub use pipeline::client::{ConversionClient, ConversionRequest, ConversionTransport, RawOutcome};
pub use pipeline::download::{DownloadTrigger, SaveToDirectory};
pub use pipeline::interpret::{interpret, ConversionResult};
pub use pipeline::validate::{validate, FileCandidate, SelectedFile, Validation};
pub use progress::{NoopStatusCallback, StatusCallback, WorkflowStatusCallback};
pub use workflow::{
    ConversionWorkflow, SubmissionId, WorkflowCommand, WorkflowDriver, WorkflowMessage,
    WorkflowStatus,
};
