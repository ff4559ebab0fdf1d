//! CLI binary for result2xlsx.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConverterConfig`, shows a spinner while the upload is in flight, and
//! reports the outcome.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use result2xlsx::{
    convert_file, ConversionRequest, ConverterConfig, StatusCallback, WorkflowStatus,
    WorkflowStatusCallback, SCHEMES, SEMESTERS,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI status callback using indicatif ──────────────────────────────────────

/// Terminal status callback: a spinner while the upload is outstanding and
/// one coloured line per settled status.
struct CliStatusCallback {
    spinner: ProgressBar,
}

impl CliStatusCallback {
    fn new() -> Arc<Self> {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        spinner.set_style(style);
        Arc::new(Self { spinner })
    }
}

impl WorkflowStatusCallback for CliStatusCallback {
    fn on_status_change(&self, status: WorkflowStatus, message: &str) {
        match status {
            WorkflowStatus::Submitting => {
                self.spinner.set_prefix("Converting");
                self.spinner.set_message(message.to_string());
                self.spinner.enable_steady_tick(Duration::from_millis(80));
            }
            WorkflowStatus::Succeeded => {
                self.spinner.finish_and_clear();
                eprintln!("{} {}", green("✔"), bold(message));
            }
            WorkflowStatus::Failed => {
                self.spinner.finish_and_clear();
                eprintln!("{} Failed: {}", red("✘"), message);
            }
            WorkflowStatus::Idle | WorkflowStatus::Ready => {}
        }
    }

    fn on_submit(&self, request: &ConversionRequest) {
        let tag = match (request.scheme(), request.semester()) {
            (Some(scheme), Some(semester)) => format!("  {scheme} Scheme · {semester}"),
            _ => String::new(),
        };
        self.spinner.println(format!(
            "{} {}{}",
            cyan("◆"),
            bold(&format!(
                "Uploading {} ({} bytes)",
                request.file().name(),
                request.file().len()
            )),
            dim(&tag)
        ));
    }

    fn on_download(&self, path: &Path, bytes: usize) {
        eprintln!(
            "   {} {}",
            dim(&format!("{bytes} bytes →")),
            bold(&path.display().to_string())
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a result sheet against a local service
  result2xlsx results.pdf

  # Tag the upload with scheme and semester
  result2xlsx --scheme 2024 --semester S3 results.pdf

  # Plain-text export, spreadsheet into ./sheets
  result2xlsx --scheme 2019 --semester S5 -o sheets results.txt

  # Remote service
  result2xlsx --url https://results.example.edu results.pdf

  # Machine-readable report
  result2xlsx --json results.pdf

ACCEPTED FILES:
  PDF documents (detected from the %PDF header or the .pdf extension)
  Plain-text exports ending in .txt

OUTPUT NAME:
  The name suggested by the service (Content-Disposition), otherwise
  {scheme}_{semester}_Results.xlsx, otherwise converted_result.xlsx.

ENVIRONMENT VARIABLES:
  RESULT2XLSX_URL         Base URL of the conversion service
  RESULT2XLSX_PATH        Endpoint path (default /generate-excel/)
  RESULT2XLSX_SCHEME      Curriculum scheme
  RESULT2XLSX_SEMESTER    Semester
  RESULT2XLSX_OUTPUT_DIR  Where to save the spreadsheet
  RUST_LOG                Override log filtering
"#;

/// Convert semester result documents to spreadsheets via a conversion service.
#[derive(Parser, Debug)]
#[command(
    name = "result2xlsx",
    version,
    about = "Convert semester result PDFs to spreadsheets via a conversion service",
    long_about = "Upload a semester result document (PDF or .txt export) to a conversion \
service, optionally tagged with curriculum scheme and semester, and save the generated \
Excel spreadsheet.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Result document: a PDF or a .txt export.
    input: PathBuf,

    /// Curriculum scheme.
    #[arg(long, env = "RESULT2XLSX_SCHEME",
          value_parser = clap::builder::PossibleValuesParser::new(SCHEMES))]
    scheme: Option<String>,

    /// Semester.
    #[arg(long, env = "RESULT2XLSX_SEMESTER",
          value_parser = clap::builder::PossibleValuesParser::new(SEMESTERS))]
    semester: Option<String>,

    /// Base URL of the conversion service.
    #[arg(long, env = "RESULT2XLSX_URL", default_value = result2xlsx::config::DEFAULT_BASE_URL)]
    url: String,

    /// Endpoint path on the service.
    #[arg(long, env = "RESULT2XLSX_PATH", default_value = result2xlsx::config::DEFAULT_ENDPOINT_PATH)]
    endpoint_path: String,

    /// Directory the spreadsheet is saved into.
    #[arg(short, long, env = "RESULT2XLSX_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Report this MIME type instead of detecting it.
    #[arg(long, env = "RESULT2XLSX_MIME")]
    mime: Option<String>,

    /// Print the conversion report as JSON on stdout.
    #[arg(long, env = "RESULT2XLSX_JSON")]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "RESULT2XLSX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "RESULT2XLSX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "RESULT2XLSX_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // With the spinner active, INFO logs would fight it for the terminal.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let status_cb: Option<StatusCallback> = if show_progress {
        Some(CliStatusCallback::new() as Arc<dyn WorkflowStatusCallback>)
    } else {
        None
    };

    let config = build_config(&cli, status_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let report = convert_file(&cli.input, &config)
        .await
        .with_context(|| format!("Conversion of {} failed", cli.input.display()))?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if !cli.quiet && !show_progress {
        // Without the spinner nobody has printed the outcome yet.
        match report.status {
            WorkflowStatus::Succeeded => eprintln!(
                "{} {}  {}",
                green("✔"),
                report.message,
                dim(&format!("{}ms", report.duration_ms))
            ),
            _ => eprintln!("{} Failed: {}", red("✘"), report.message),
        }
    }

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

/// Map CLI args to `ConverterConfig`.
fn build_config(cli: &Cli, status: Option<StatusCallback>) -> Result<ConverterConfig> {
    let mut builder = ConverterConfig::builder()
        .base_url(cli.url.clone())
        .endpoint_path(cli.endpoint_path.clone())
        .output_dir(cli.output_dir.clone());

    if let Some(ref scheme) = cli.scheme {
        builder = builder.scheme(scheme.clone());
    }
    if let Some(ref semester) = cli.semester {
        builder = builder.semester(semester.clone());
    }
    if let Some(ref mime) = cli.mime {
        builder = builder.mime_override(mime.clone());
    }
    if let Some(cb) = status {
        builder = builder.status_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
