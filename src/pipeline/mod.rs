//! Pipeline stages for the upload-and-convert workflow.
//!
//! Each submodule implements exactly one step. Only [`client`] and
//! [`download`] touch the outside world; the rest are pure functions.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ validate ──▶ client ──▶ interpret ──▶ download
//! (path)    (pdf/txt)    (POST)     (xlsx|error)  (save)
//! ```
//!
//! 1. [`input`]     — read a local file and sniff its MIME type
//! 2. [`validate`]  — accept PDFs and `.txt` files, reject everything else
//! 3. [`client`]    — multipart upload, single attempt, transport errors
//!    captured as data
//! 4. [`interpret`] — status code, `Content-Disposition` and `detail` body
//!    to a typed result
//! 5. [`download`]  — atomic save into the output directory
//!
//! [`crate::workflow`] sequences the steps and owns the status.

pub mod client;
pub mod download;
pub mod input;
pub mod interpret;
pub mod validate;
