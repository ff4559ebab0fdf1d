//! Download: save a converted spreadsheet under its derived name.
//!
//! The browser version of this step is "save blob as". Here it writes into
//! an output directory. Writes are atomic (temp file in the same directory,
//! then rename) so an interrupted run never leaves a truncated `.xlsx`
//! behind. Errors are returned to the caller; the driver turns them into a
//! `Failed` status.

use crate::context::DEFAULT_FILENAME;
use crate::error::ConvertError;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Performs the "save file" side effect for a successful conversion.
pub trait DownloadTrigger {
    /// Save `payload` as `filename`; returns where it ended up.
    fn trigger(
        &self,
        filename: &str,
        payload: &[u8],
    ) -> impl Future<Output = Result<PathBuf, ConvertError>> + Send;
}

/// Writes spreadsheets into a directory, creating it if needed.
#[derive(Debug, Clone)]
pub struct SaveToDirectory {
    dir: PathBuf,
    fallback_name: String,
}

impl SaveToDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            fallback_name: DEFAULT_FILENAME.to_string(),
        }
    }

    /// Name used when the suggested one reduces to nothing, usually
    /// [`SubmissionContext::fallback_filename`](crate::SubmissionContext::fallback_filename).
    pub fn with_fallback_name(mut self, name: impl Into<String>) -> Self {
        self.fallback_name = name.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn save(&self, filename: &str, payload: &[u8]) -> Result<PathBuf, ConvertError> {
        let name = safe_file_name(filename, &self.fallback_name);
        let path = self.dir.join(&name);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ConvertError::OutputWriteFailed {
                path: path.clone(),
                source: e,
            })?;

        let dir = self.dir.clone();
        let target = path.clone();
        let bytes = payload.to_vec();
        tokio::task::spawn_blocking(move || write_atomic(&dir, &target, &bytes))
            .await
            .map_err(|e| ConvertError::Internal(format!("write task: {e}")))??;

        info!("Saved {} ({} bytes)", path.display(), payload.len());
        Ok(path)
    }
}

impl DownloadTrigger for SaveToDirectory {
    fn trigger(
        &self,
        filename: &str,
        payload: &[u8],
    ) -> impl Future<Output = Result<PathBuf, ConvertError>> + Send {
        self.save(filename, payload)
    }
}

/// Temp file next to the target, then rename over it.
fn write_atomic(dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), ConvertError> {
    let fail = |source: std::io::Error| ConvertError::OutputWriteFailed {
        path: target.to_path_buf(),
        source,
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(fail)?;
    tmp.write_all(bytes).map_err(fail)?;
    tmp.as_file().sync_all().map_err(fail)?;
    tmp.persist(target).map_err(|e| fail(e.error))?;
    Ok(())
}

/// Reduce a server-suggested name to a bare file name.
///
/// Directory parts (either separator) are dropped so the service cannot
/// steer the write outside the output directory. `fallback` is used when
/// nothing usable is left.
pub fn safe_file_name(suggested: &str, fallback: &str) -> String {
    let last = suggested
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    match last {
        "" | "." | ".." => fallback.to_string(),
        name => name.to_string(),
    }
}
