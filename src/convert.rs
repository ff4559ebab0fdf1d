//! One-shot entry points: select a document, convert it, save the result.
//!
//! These wrap a [`WorkflowDriver`] built from a [`ConverterConfig`] for
//! callers that have a single file and no UI loop: the CLI, scripts, tests.
//! Interactive front ends should hold a driver (or a bare
//! [`crate::workflow::ConversionWorkflow`]) themselves.

use crate::config::ConverterConfig;
use crate::error::ConvertError;
use crate::output::ConversionReport;
use crate::pipeline::client::ConversionClient;
use crate::pipeline::download::SaveToDirectory;
use crate::pipeline::input;
use crate::pipeline::validate::FileCandidate;
use crate::workflow::{ConversionWorkflow, WorkflowDriver};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Build a driver wired to the HTTP client and the output directory.
pub fn driver_from_config(
    config: &ConverterConfig,
) -> Result<WorkflowDriver<ConversionClient, SaveToDirectory>, ConvertError> {
    let client = ConversionClient::new(config)?;
    let saver = SaveToDirectory::new(config.output_dir.clone())
        .with_fallback_name(config.context.fallback_filename());
    Ok(
        WorkflowDriver::new(ConversionWorkflow::new(config.context.clone()), client, saver)
            .with_callback(config.status_callback.clone()),
    )
}

/// Convert a local document.
///
/// A rejected file, an unreachable service or a service-side failure all
/// produce `Ok` with a `failed` report; use
/// [`ConversionReport::into_result`] to turn those into errors.
///
/// # Example
/// ```rust,no_run
/// use result2xlsx::{convert_file, ConverterConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ConverterConfig::builder().scheme("2024").semester("S3").build()?;
/// let report = convert_file("results.pdf", &config).await?.into_result()?;
/// println!("saved to {:?}", report.saved_to);
/// # Ok(())
/// # }
/// ```
pub async fn convert_file(
    path: impl AsRef<Path>,
    config: &ConverterConfig,
) -> Result<ConversionReport, ConvertError> {
    let candidate = input::load_candidate(path.as_ref(), config.mime_override.as_deref()).await?;
    run(candidate, config).await
}

/// Convert a document already in memory.
///
/// The MIME type is sniffed from `name` and the leading bytes unless the
/// config carries an override.
pub async fn convert_bytes(
    name: impl Into<String>,
    bytes: Vec<u8>,
    config: &ConverterConfig,
) -> Result<ConversionReport, ConvertError> {
    let name = name.into();
    let mime_type = match config.mime_override.as_deref() {
        Some(m) => m.to_string(),
        None => input::sniff_mime(&name, &bytes).to_string(),
    };
    run(FileCandidate::new(name, mime_type, bytes), config).await
}

/// Synchronous wrapper around [`convert_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    path: impl AsRef<Path>,
    config: &ConverterConfig,
) -> Result<ConversionReport, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_file(path, config))
}

async fn run(
    candidate: FileCandidate,
    config: &ConverterConfig,
) -> Result<ConversionReport, ConvertError> {
    let start = Instant::now();
    let file_name = candidate.name.clone();
    let mut driver = driver_from_config(config)?;

    driver.select_file(candidate);
    driver.convert().await?;

    let report = ConversionReport {
        file_name,
        context: config.context.clone(),
        status: driver.status(),
        message: driver.message().to_string(),
        saved_to: driver.saved_path().cloned(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "'{}' finished as {} in {}ms",
        report.file_name, report.status, report.duration_ms
    );
    Ok(report)
}
