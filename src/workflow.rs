//! The upload-and-convert state machine and its async driver.
//!
//! [`ConversionWorkflow`] is a plain value with one transition function,
//! [`ConversionWorkflow::update`]. It consumes discrete
//! [`WorkflowMessage`]s and answers with at most one [`WorkflowCommand`] for
//! the caller to execute. It never performs I/O itself, so every transition
//! can be tested without a network or a file system.
//!
//! ```text
//!            FileSelected(ok)                ConvertRequested
//!  Idle ───────────────────────▶ Ready ───────────────────────▶ Submitting
//!   ▲  ◀── FileCleared ─────────  │ ▲                             │      │
//!   │                             │ │ FileSelected(ok)    Success │      │ Failure
//!   │      FileSelected(bad)      ▼ │                             ▼      ▼
//!   └──────────────────────────▶ Failed ◀─────────────────── Succeeded / Failed
//! ```
//!
//! [`WorkflowDriver`] owns a workflow together with a
//! [`ConversionTransport`] and a [`DownloadTrigger`] and runs the commands.
//! Every driver method takes `&mut self`, so one instance can never have two
//! uploads in flight. If a `convert` future is dropped mid-upload, the driver
//! sends [`WorkflowMessage::SubmissionAbandoned`] and the workflow goes back
//! to `Ready` with its file kept; the late outcome, if any, is never applied.

use crate::context::SubmissionContext;
use crate::error::ConvertError;
use crate::pipeline::client::{ConversionRequest, ConversionTransport, RawOutcome};
use crate::pipeline::download::DownloadTrigger;
use crate::pipeline::interpret::{interpret, ConversionResult};
use crate::pipeline::validate::{validate, FileCandidate, SelectedFile, Validation};
use crate::progress::StatusCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Message shown while an upload is outstanding.
pub const SUBMITTING_MESSAGE: &str = "Processing file... This may take a moment.";

/// User-visible status of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// No file selected.
    Idle,
    /// A valid file is selected and may be converted.
    Ready,
    /// The upload is in flight.
    Submitting,
    /// The spreadsheet was produced and handed to the download step.
    Succeeded,
    /// Validation, transport or the service failed.
    Failed,
}

impl WorkflowStatus {
    /// `true` for the two outcome states.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Ready => write!(f, "ready"),
            Self::Submitting => write!(f, "submitting"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Identifies one submission so a late outcome can be matched to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmissionId(u64);

/// Input events for [`ConversionWorkflow::update`].
#[derive(Debug, Clone)]
pub enum WorkflowMessage {
    /// The user picked a file.
    FileSelected(FileCandidate),
    /// The user removed the selection.
    FileCleared,
    /// The user asked for a conversion.
    ConvertRequested,
    /// The transport finished the submission `submission`.
    OutcomeReceived {
        submission: SubmissionId,
        outcome: RawOutcome,
    },
    /// Nobody is waiting for `submission` any more.
    SubmissionAbandoned(SubmissionId),
    /// Saving the spreadsheet `filename` did not complete.
    DownloadFailed { filename: String, reason: String },
}

impl WorkflowMessage {
    /// Short name for logging.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::FileSelected(_) => "file_selected",
            Self::FileCleared => "file_cleared",
            Self::ConvertRequested => "convert_requested",
            Self::OutcomeReceived { .. } => "outcome_received",
            Self::SubmissionAbandoned(_) => "submission_abandoned",
            Self::DownloadFailed { .. } => "download_failed",
        }
    }
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowCommand {
    /// Send `request`, then report back with `OutcomeReceived { submission, .. }`.
    Submit {
        submission: SubmissionId,
        request: ConversionRequest,
    },
    /// Save the spreadsheet.
    Download { filename: String, payload: Vec<u8> },
}

/// The status state machine for one conversion screen.
#[derive(Debug, Clone)]
pub struct ConversionWorkflow {
    status: WorkflowStatus,
    message: String,
    file: Option<SelectedFile>,
    context: SubmissionContext,
    in_flight: Option<SubmissionId>,
    next_submission: u64,
}

impl Default for ConversionWorkflow {
    fn default() -> Self {
        Self::new(SubmissionContext::default())
    }
}

impl ConversionWorkflow {
    /// A workflow in `Idle`. An empty context is the context-free variant.
    pub fn new(context: SubmissionContext) -> Self {
        Self {
            status: WorkflowStatus::Idle,
            message: String::new(),
            file: None,
            context,
            in_flight: None,
            next_submission: 0,
        }
    }

    pub fn status(&self) -> WorkflowStatus {
        self.status
    }

    /// Display message of the current status. Empty for `Idle` and `Ready`.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn context(&self) -> &SubmissionContext {
        &self.context
    }

    /// Whether a convert button should be enabled.
    pub fn can_convert(&self) -> bool {
        self.status == WorkflowStatus::Ready
    }

    /// Apply one message. Returns the side effect the caller must perform,
    /// if any.
    pub fn update(&mut self, msg: WorkflowMessage) -> Option<WorkflowCommand> {
        let event = msg.event_type();
        let before = self.status;
        let command = match msg {
            WorkflowMessage::FileSelected(candidate) => {
                self.on_file_selected(candidate);
                None
            }
            WorkflowMessage::FileCleared => {
                self.on_file_cleared();
                None
            }
            WorkflowMessage::ConvertRequested => self.on_convert_requested(),
            WorkflowMessage::OutcomeReceived {
                submission,
                outcome,
            } => self.on_outcome(submission, outcome),
            WorkflowMessage::SubmissionAbandoned(submission) => {
                self.on_abandoned(submission);
                None
            }
            WorkflowMessage::DownloadFailed { filename, reason } => {
                self.on_download_failed(&filename, &reason);
                None
            }
        };
        debug!("{event}: {before} -> {}", self.status);
        command
    }

    fn on_file_selected(&mut self, candidate: FileCandidate) {
        if self.status == WorkflowStatus::Submitting {
            warn!("Ignoring file selection while an upload is in flight");
            return;
        }
        match validate(candidate) {
            Validation::Accepted(file) => {
                self.file = Some(file);
                self.set(WorkflowStatus::Ready, String::new());
            }
            Validation::Rejected(reason) => {
                self.file = None;
                self.set(WorkflowStatus::Failed, reason);
            }
        }
    }

    fn on_file_cleared(&mut self) {
        if self.status == WorkflowStatus::Submitting {
            warn!("Ignoring file removal while an upload is in flight");
            return;
        }
        self.file = None;
        self.set(WorkflowStatus::Idle, String::new());
    }

    fn on_convert_requested(&mut self) -> Option<WorkflowCommand> {
        if self.status != WorkflowStatus::Ready {
            debug!("Convert requested in {}, ignored", self.status);
            return None;
        }
        let file = self.file.clone()?;
        let submission = SubmissionId(self.next_submission);
        self.next_submission += 1;
        self.in_flight = Some(submission);
        self.set(WorkflowStatus::Submitting, SUBMITTING_MESSAGE.to_string());
        Some(WorkflowCommand::Submit {
            submission,
            request: ConversionRequest::new(file, &self.context),
        })
    }

    fn on_outcome(
        &mut self,
        submission: SubmissionId,
        outcome: RawOutcome,
    ) -> Option<WorkflowCommand> {
        if self.status != WorkflowStatus::Submitting || self.in_flight != Some(submission) {
            warn!("Discarding outcome of stale submission {:?}", submission);
            return None;
        }
        self.in_flight = None;
        match interpret(&outcome, &self.context) {
            ConversionResult::Success { filename, payload } => {
                info!("Conversion succeeded: {} ({} bytes)", filename, payload.len());
                self.set(WorkflowStatus::Succeeded, format!("Downloaded: {filename}"));
                Some(WorkflowCommand::Download { filename, payload })
            }
            ConversionResult::Failure(failure) => {
                info!("Conversion failed: {}", failure);
                self.set(WorkflowStatus::Failed, failure.message());
                None
            }
        }
    }

    fn on_abandoned(&mut self, submission: SubmissionId) {
        if self.status != WorkflowStatus::Submitting || self.in_flight != Some(submission) {
            debug!("Submission {:?} is not in flight, nothing to abandon", submission);
            return;
        }
        warn!("Submission {:?} abandoned before its outcome arrived", submission);
        self.in_flight = None;
        self.set(WorkflowStatus::Ready, String::new());
    }

    fn on_download_failed(&mut self, filename: &str, reason: &str) {
        if self.status != WorkflowStatus::Succeeded {
            debug!("Download failure reported in {}, ignored", self.status);
            return;
        }
        self.set(
            WorkflowStatus::Failed,
            format!("could not save {filename}: {reason}"),
        );
    }

    fn set(&mut self, status: WorkflowStatus, message: String) {
        debug_assert!(!status.is_settled() || !message.is_empty());
        self.status = status;
        self.message = message;
    }
}

/// Runs a [`ConversionWorkflow`] against real collaborators.
pub struct WorkflowDriver<T, D> {
    workflow: ConversionWorkflow,
    transport: T,
    download: D,
    callback: Option<StatusCallback>,
    saved: Option<PathBuf>,
}

impl<T, D> WorkflowDriver<T, D>
where
    T: ConversionTransport,
    D: DownloadTrigger,
{
    pub fn new(workflow: ConversionWorkflow, transport: T, download: D) -> Self {
        Self {
            workflow,
            transport,
            download,
            callback: None,
            saved: None,
        }
    }

    /// Notify `callback` on every status change.
    pub fn with_callback(mut self, callback: Option<StatusCallback>) -> Self {
        self.callback = callback;
        self
    }

    pub fn workflow(&self) -> &ConversionWorkflow {
        &self.workflow
    }

    pub fn status(&self) -> WorkflowStatus {
        self.workflow.status()
    }

    pub fn message(&self) -> &str {
        self.workflow.message()
    }

    /// Where the last successful conversion was saved.
    pub fn saved_path(&self) -> Option<&PathBuf> {
        self.saved.as_ref()
    }

    /// Offer a file; moves to `Ready` or `Failed`.
    pub fn select_file(&mut self, candidate: FileCandidate) -> WorkflowStatus {
        self.apply(WorkflowMessage::FileSelected(candidate));
        self.status()
    }

    /// Drop the current file; back to `Idle`.
    pub fn clear_file(&mut self) -> WorkflowStatus {
        self.apply(WorkflowMessage::FileCleared);
        self.status()
    }

    /// Run one conversion if the workflow is `Ready`; otherwise do nothing.
    ///
    /// Conversion failures end in the `Failed` status and are not errors.
    /// `Err` is returned only when saving the spreadsheet fails; the status
    /// is then `Failed` too. Listeners see `Succeeded` only once the file is
    /// saved.
    ///
    /// Dropping the returned future during the upload puts the workflow back
    /// in `Ready` with the same file; dropping it during the save ends in
    /// `Failed`.
    pub async fn convert(&mut self) -> Result<WorkflowStatus, ConvertError> {
        let Some(WorkflowCommand::Submit {
            submission,
            request,
        }) = self.apply(WorkflowMessage::ConvertRequested)
        else {
            return Ok(self.status());
        };

        if let Some(cb) = &self.callback {
            cb.on_submit(&request);
        }
        let outcome = {
            let guard = DropGuard::new(
                &mut self.workflow,
                self.callback.as_ref(),
                WorkflowMessage::SubmissionAbandoned(submission),
            );
            let outcome = self.transport.submit(&request).await;
            guard.disarm();
            outcome
        };

        let Some(WorkflowCommand::Download { filename, payload }) =
            self.workflow.update(WorkflowMessage::OutcomeReceived {
                submission,
                outcome,
            })
        else {
            notify(&self.workflow, self.callback.as_ref());
            return Ok(self.status());
        };

        let saved = {
            let guard = DropGuard::new(
                &mut self.workflow,
                self.callback.as_ref(),
                WorkflowMessage::DownloadFailed {
                    filename: filename.clone(),
                    reason: "interrupted".to_string(),
                },
            );
            let saved = self.download.trigger(&filename, &payload).await;
            guard.disarm();
            saved
        };

        match saved {
            Ok(path) => {
                notify(&self.workflow, self.callback.as_ref());
                if let Some(cb) = &self.callback {
                    cb.on_download(&path, payload.len());
                }
                self.saved = Some(path);
                Ok(self.status())
            }
            Err(e) => {
                self.apply(WorkflowMessage::DownloadFailed {
                    filename,
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn apply(&mut self, msg: WorkflowMessage) -> Option<WorkflowCommand> {
        apply_to(&mut self.workflow, self.callback.as_ref(), msg)
    }
}

/// Update `workflow` and tell `callback` if the status or message changed.
fn apply_to(
    workflow: &mut ConversionWorkflow,
    callback: Option<&StatusCallback>,
    msg: WorkflowMessage,
) -> Option<WorkflowCommand> {
    let before = (workflow.status(), workflow.message().to_string());
    let command = workflow.update(msg);
    if before.0 != workflow.status() || before.1 != workflow.message() {
        notify(workflow, callback);
    }
    command
}

fn notify(workflow: &ConversionWorkflow, callback: Option<&StatusCallback>) {
    if let Some(cb) = callback {
        cb.on_status_change(workflow.status(), workflow.message());
    }
}

/// Sends `pending` to the workflow unless disarmed before it is dropped.
struct DropGuard<'a> {
    workflow: &'a mut ConversionWorkflow,
    callback: Option<&'a StatusCallback>,
    pending: Option<WorkflowMessage>,
}

impl<'a> DropGuard<'a> {
    fn new(
        workflow: &'a mut ConversionWorkflow,
        callback: Option<&'a StatusCallback>,
        pending: WorkflowMessage,
    ) -> Self {
        Self {
            workflow,
            callback,
            pending: Some(pending),
        }
    }

    fn disarm(mut self) {
        self.pending = None;
    }
}

impl Drop for DropGuard<'_> {
    fn drop(&mut self) {
        if let Some(msg) = self.pending.take() {
            apply_to(self.workflow, self.callback, msg);
        }
    }
}
