//! Integration tests for the upload-and-convert workflow.
//!
//! HTTP tests talk to a one-shot responder bound on loopback: it captures
//! the raw request, answers with a canned response and closes. Driver tests
//! use in-memory fakes for the transport and the download step.
//!
//! Run with:
//!   cargo test --test workflow

use result2xlsx::error::{INVALID_FILE_TYPE, NETWORK_ERROR_MESSAGE};
use result2xlsx::{
    convert_bytes, convert_file, ConversionRequest, ConversionTransport, ConversionWorkflow,
    ConvertError, ConverterConfig, DownloadTrigger, FileCandidate, RawOutcome, SubmissionContext,
    WorkflowDriver, WorkflowStatus, WorkflowStatusCallback,
};
use std::future::{ready, Future};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Route library logs to the test output; `RUST_LOG=result2xlsx=debug` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Serve exactly one HTTP exchange. Returns the base URL and a handle that
/// resolves to the raw request bytes.
async fn one_shot_server(response: Vec<u8>) -> (String, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 8192];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
            if request_complete(&request) {
                break;
            }
        }
        socket.write_all(&response).await.unwrap();
        socket.shutdown().await.ok();
        request
    });

    (format!("http://{addr}"), handle)
}

/// `true` once headers and the whole body have arrived.
fn request_complete(buf: &[u8]) -> bool {
    let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let body = &buf[header_end + 4..];
    match head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
    {
        Some(len) => body.len() >= len,
        None => body.ends_with(b"0\r\n\r\n"),
    }
}

fn http_response(status_line: &str, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut out = format!("HTTP/1.1 {status_line}\r\n");
    for (name, value) in headers {
        out.push_str(&format!("{name}: {value}\r\n"));
    }
    out.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    ));
    let mut bytes = out.into_bytes();
    bytes.extend_from_slice(body);
    bytes
}

/// A loopback URL nothing is listening on.
async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

const XLSX: &[u8] = b"PK\x03\x04 fake spreadsheet";

fn pdf(name: &str) -> FileCandidate {
    FileCandidate::new(name, "application/pdf", b"%PDF-1.7 result sheet".to_vec())
}

// ── Fakes ────────────────────────────────────────────────────────────────────

struct FakeTransport {
    outcome: RawOutcome,
    seen: Mutex<Vec<ConversionRequest>>,
}

impl FakeTransport {
    fn new(outcome: RawOutcome) -> Self {
        Self {
            outcome,
            seen: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

impl ConversionTransport for &FakeTransport {
    fn submit(&self, request: &ConversionRequest) -> impl Future<Output = RawOutcome> + Send {
        self.seen.lock().unwrap().push(request.clone());
        ready(self.outcome.clone())
    }
}

/// Never answers its first `stalls` submissions; answers the rest with `outcome`.
struct StallingTransport {
    stalls: usize,
    outcome: RawOutcome,
    calls: Mutex<usize>,
}

impl StallingTransport {
    fn new(stalls: usize, outcome: RawOutcome) -> Self {
        Self {
            stalls,
            outcome,
            calls: Mutex::new(0),
        }
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl ConversionTransport for &StallingTransport {
    fn submit(&self, _request: &ConversionRequest) -> impl Future<Output = RawOutcome> + Send {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        let stall = *calls <= self.stalls;
        let outcome = self.outcome.clone();
        async move {
            if stall {
                std::future::pending::<()>().await;
            }
            outcome
        }
    }
}

#[derive(Default)]
struct RecordingDownload {
    saved: Mutex<Vec<(String, Vec<u8>)>>,
    fail: bool,
}

impl DownloadTrigger for &RecordingDownload {
    fn trigger(
        &self,
        filename: &str,
        payload: &[u8],
    ) -> impl Future<Output = Result<PathBuf, ConvertError>> + Send {
        self.saved
            .lock()
            .unwrap()
            .push((filename.to_string(), payload.to_vec()));
        ready(if self.fail {
            Err(ConvertError::OutputWriteFailed {
                path: PathBuf::from(filename),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            })
        } else {
            Ok(PathBuf::from(filename))
        })
    }
}

#[derive(Default)]
struct StatusLog(Mutex<Vec<(WorkflowStatus, String)>>);

impl WorkflowStatusCallback for StatusLog {
    fn on_status_change(&self, status: WorkflowStatus, message: &str) {
        self.0.lock().unwrap().push((status, message.to_string()));
    }
}

fn ok_outcome(disposition: Option<&str>) -> RawOutcome {
    let mut headers = reqwest::header::HeaderMap::new();
    if let Some(d) = disposition {
        headers.insert(
            reqwest::header::CONTENT_DISPOSITION,
            reqwest::header::HeaderValue::from_str(d).unwrap(),
        );
    }
    RawOutcome::Response {
        status: 200,
        headers,
        body: XLSX.to_vec(),
    }
}

// ── HTTP round trips ─────────────────────────────────────────────────────────

#[tokio::test]
async fn pdf_with_context_is_saved_under_server_name() {
    init_tracing();
    let response = http_response(
        "200 OK",
        &[
            (
                "Content-Type",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ),
            ("Content-Disposition", r#"attachment; filename="2019_S5_Results.xlsx""#),
        ],
        XLSX,
    );
    let (url, server) = one_shot_server(response).await;
    let out = tempfile::tempdir().unwrap();

    let config = ConverterConfig::builder()
        .base_url(url)
        .scheme("2019")
        .semester("S5")
        .output_dir(out.path())
        .build()
        .unwrap();

    let report = convert_bytes("results.pdf", b"%PDF-1.7 result sheet".to_vec(), &config)
        .await
        .unwrap();

    assert_eq!(report.status, WorkflowStatus::Succeeded);
    let saved = report.saved_to.clone().expect("spreadsheet path");
    assert_eq!(saved, out.path().join("2019_S5_Results.xlsx"));
    assert_eq!(std::fs::read(&saved).unwrap(), XLSX);

    let request = String::from_utf8_lossy(&server.await.unwrap()).to_string();
    let lower = request.to_ascii_lowercase();
    assert!(request.starts_with("POST /generate-excel/ HTTP/1.1"), "got: {request}");
    assert!(lower.contains("content-type: multipart/form-data; boundary="));
    assert!(request.contains(r#"name="file"; filename="results.pdf""#));
    assert!(lower.contains("content-type: application/pdf"));
    assert!(request.contains("%PDF-1.7 result sheet"));
    assert!(request.contains("name=\"scheme\"\r\n\r\n2019\r\n"));
    assert!(request.contains("name=\"semester\"\r\n\r\nS5\r\n"));
}

#[tokio::test]
async fn context_free_upload_uses_default_name() {
    let (url, server) = one_shot_server(http_response("200 OK", &[], XLSX)).await;
    let out = tempfile::tempdir().unwrap();
    let config = ConverterConfig::builder()
        .base_url(url)
        .output_dir(out.path())
        .build()
        .unwrap();

    let report = convert_bytes("results.txt", b"PKD22CS001 ...".to_vec(), &config)
        .await
        .unwrap();

    assert!(report.is_success(), "got {report:?}");
    assert_eq!(
        report.saved_to.as_deref(),
        Some(out.path().join("converted_result.xlsx").as_path())
    );

    let request = String::from_utf8_lossy(&server.await.unwrap()).to_string();
    assert!(!request.contains(r#"name="scheme""#));
    assert!(!request.contains(r#"name="semester""#));
}

#[tokio::test]
async fn missing_header_falls_back_to_context_name() {
    let (url, _server) = one_shot_server(http_response("200 OK", &[], XLSX)).await;
    let out = tempfile::tempdir().unwrap();
    let config = ConverterConfig::builder()
        .base_url(url)
        .scheme("2024")
        .semester("S3")
        .output_dir(out.path())
        .build()
        .unwrap();

    let report = convert_bytes("results.pdf", b"%PDF".to_vec(), &config)
        .await
        .unwrap();
    assert_eq!(
        report.saved_to.unwrap().file_name().unwrap(),
        "2024_S3_Results.xlsx"
    );
}

#[tokio::test]
async fn server_detail_is_reported() {
    let response = http_response(
        "400 Bad Request",
        &[("Content-Type", "application/json")],
        br#"{"detail":"Bad PDF"}"#,
    );
    let (url, _server) = one_shot_server(response).await;
    let out = tempfile::tempdir().unwrap();
    let config = ConverterConfig::builder()
        .base_url(url)
        .output_dir(out.path())
        .build()
        .unwrap();

    let report = convert_bytes("results.pdf", b"%PDF".to_vec(), &config)
        .await
        .unwrap();
    assert_eq!(report.status, WorkflowStatus::Failed);
    assert_eq!(report.message, "Bad PDF");
    assert!(report.saved_to.is_none());
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);

    let err = report.into_result().unwrap_err();
    assert!(matches!(err, ConvertError::ConversionFailed { .. }));
}

#[tokio::test]
async fn unparsable_error_body_is_generic() {
    let response = http_response("500 Internal Server Error", &[], b"Internal Server Error");
    let (url, _server) = one_shot_server(response).await;
    let config = ConverterConfig::builder().base_url(url).build().unwrap();

    let report = convert_bytes("results.pdf", b"%PDF".to_vec(), &config)
        .await
        .unwrap();
    assert_eq!(report.status, WorkflowStatus::Failed);
    assert_eq!(report.message, "Server Error (500)");
}

#[tokio::test]
async fn unreachable_service_is_a_network_error() {
    init_tracing();
    let config = ConverterConfig::builder()
        .base_url(dead_url().await)
        .build()
        .unwrap();

    let report = convert_bytes("results.pdf", b"%PDF".to_vec(), &config)
        .await
        .unwrap();
    assert_eq!(report.status, WorkflowStatus::Failed);
    assert_eq!(report.message, NETWORK_ERROR_MESSAGE);
}

#[tokio::test]
async fn local_txt_file_is_uploaded() {
    use std::io::Write;

    let (url, server) = one_shot_server(http_response(
        "200 OK",
        &[("Content-Disposition", "attachment; filename=Semester_Result.xlsx")],
        XLSX,
    ))
    .await;
    let out = tempfile::tempdir().unwrap();
    let mut input = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    input.write_all(b"\"CST201\",\"DATA STRUCTURES\"\n").unwrap();

    let config = ConverterConfig::builder()
        .base_url(url)
        .output_dir(out.path())
        .build()
        .unwrap();
    let report = convert_file(input.path(), &config).await.unwrap();

    assert!(report.is_success(), "got {report:?}");
    assert_eq!(
        report.saved_to.unwrap(),
        out.path().join("Semester_Result.xlsx")
    );
    let request = String::from_utf8_lossy(&server.await.unwrap()).to_ascii_lowercase();
    assert!(request.contains("content-type: text/plain"));
}

// ── Driver with fakes ────────────────────────────────────────────────────────

#[tokio::test]
async fn end_to_end_download_fires_once_with_exact_arguments() {
    let transport = FakeTransport::new(ok_outcome(Some(
        r#"attachment; filename="2019_S5_Results.xlsx""#,
    )));
    let download = RecordingDownload::default();
    let log = Arc::new(StatusLog::default());

    let mut driver = WorkflowDriver::new(
        ConversionWorkflow::new(SubmissionContext::new("2019", "S5")),
        &transport,
        &download,
    )
    .with_callback(Some(log.clone()));

    assert_eq!(driver.select_file(pdf("results.pdf")), WorkflowStatus::Ready);
    assert_eq!(driver.convert().await.unwrap(), WorkflowStatus::Succeeded);

    assert_eq!(transport.calls(), 1);
    let saved = download.saved.lock().unwrap().clone();
    assert_eq!(saved, vec![("2019_S5_Results.xlsx".to_string(), XLSX.to_vec())]);
    assert_eq!(
        driver.saved_path(),
        Some(&PathBuf::from("2019_S5_Results.xlsx"))
    );

    let statuses: Vec<WorkflowStatus> = log.0.lock().unwrap().iter().map(|(s, _)| *s).collect();
    assert_eq!(
        statuses,
        vec![
            WorkflowStatus::Ready,
            WorkflowStatus::Submitting,
            WorkflowStatus::Succeeded
        ]
    );
}

#[tokio::test]
async fn rejected_file_never_sends_a_request() {
    let transport = FakeTransport::new(ok_outcome(None));
    let download = RecordingDownload::default();
    let mut driver = WorkflowDriver::new(ConversionWorkflow::default(), &transport, &download);

    let status = driver.select_file(FileCandidate::new(
        "notes.docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        b"PK\x03\x04".to_vec(),
    ));
    assert_eq!(status, WorkflowStatus::Failed);
    assert_eq!(driver.message(), INVALID_FILE_TYPE);

    assert_eq!(driver.convert().await.unwrap(), WorkflowStatus::Failed);
    assert_eq!(transport.calls(), 0);
    assert!(download.saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn convert_requires_a_fresh_selection() {
    let transport = FakeTransport::new(ok_outcome(None));
    let download = RecordingDownload::default();
    let mut driver = WorkflowDriver::new(ConversionWorkflow::default(), &transport, &download);

    assert_eq!(driver.convert().await.unwrap(), WorkflowStatus::Idle);
    assert_eq!(transport.calls(), 0);

    driver.select_file(pdf("results.pdf"));
    driver.convert().await.unwrap();
    // Settled: a second convert without reselecting is a no-op.
    driver.convert().await.unwrap();
    assert_eq!(transport.calls(), 1);
    assert_eq!(download.saved.lock().unwrap().len(), 1);

    driver.select_file(pdf("results.pdf"));
    driver.convert().await.unwrap();
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn download_failure_propagates_and_fails_the_workflow() {
    init_tracing();
    let transport = FakeTransport::new(ok_outcome(None));
    let download = RecordingDownload {
        fail: true,
        ..Default::default()
    };
    let log = Arc::new(StatusLog::default());
    let mut driver = WorkflowDriver::new(ConversionWorkflow::default(), &transport, &download)
        .with_callback(Some(log.clone()));

    driver.select_file(pdf("results.pdf"));
    let err = driver.convert().await.unwrap_err();
    assert!(matches!(err, ConvertError::OutputWriteFailed { .. }), "got {err:?}");
    assert_eq!(driver.status(), WorkflowStatus::Failed);
    assert!(
        driver.message().starts_with("could not save converted_result.xlsx: "),
        "got {}",
        driver.message()
    );
    assert!(driver.message().contains("disk full"));
    assert!(driver.saved_path().is_none());

    // Listeners never hear about a success that was not saved.
    let statuses: Vec<WorkflowStatus> = log.0.lock().unwrap().iter().map(|(s, _)| *s).collect();
    assert_eq!(
        statuses,
        vec![
            WorkflowStatus::Ready,
            WorkflowStatus::Submitting,
            WorkflowStatus::Failed
        ]
    );
}

#[tokio::test]
async fn dropped_convert_leaves_the_driver_usable() {
    init_tracing();
    let transport = StallingTransport::new(1, ok_outcome(None));
    let download = RecordingDownload::default();
    let log = Arc::new(StatusLog::default());
    let mut driver = WorkflowDriver::new(
        ConversionWorkflow::new(SubmissionContext::new("2024", "S3")),
        &transport,
        &download,
    )
    .with_callback(Some(log.clone()));

    driver.select_file(pdf("results.pdf"));
    let timed_out = tokio::time::timeout(Duration::from_millis(50), driver.convert()).await;
    assert!(timed_out.is_err(), "upload should still be pending");

    assert_eq!(driver.status(), WorkflowStatus::Ready);
    assert!(driver.message().is_empty());
    assert!(driver.workflow().can_convert());
    assert_eq!(driver.workflow().selected_file().unwrap().name(), "results.pdf");
    assert!(download.saved.lock().unwrap().is_empty());

    assert_eq!(driver.clear_file(), WorkflowStatus::Idle);
    assert_eq!(driver.select_file(pdf("results.pdf")), WorkflowStatus::Ready);
    assert_eq!(driver.convert().await.unwrap(), WorkflowStatus::Succeeded);
    assert_eq!(transport.calls(), 2);
    assert_eq!(driver.message(), "Downloaded: 2024_S3_Results.xlsx");

    let saved = download.saved.lock().unwrap().clone();
    assert_eq!(saved, vec![("2024_S3_Results.xlsx".to_string(), XLSX.to_vec())]);

    let statuses: Vec<WorkflowStatus> = log.0.lock().unwrap().iter().map(|(s, _)| *s).collect();
    assert_eq!(
        statuses,
        vec![
            WorkflowStatus::Ready,
            WorkflowStatus::Submitting,
            WorkflowStatus::Ready,
            WorkflowStatus::Idle,
            WorkflowStatus::Ready,
            WorkflowStatus::Submitting,
            WorkflowStatus::Succeeded
        ]
    );
}

#[tokio::test]
async fn failed_conversion_can_be_retried_after_reselect() {
    let failing = FakeTransport::new(RawOutcome::TransportFailure("refused".into()));
    let download = RecordingDownload::default();
    let mut driver = WorkflowDriver::new(ConversionWorkflow::default(), &failing, &download);

    driver.select_file(pdf("results.pdf"));
    assert_eq!(driver.convert().await.unwrap(), WorkflowStatus::Failed);
    assert_eq!(driver.message(), NETWORK_ERROR_MESSAGE);

    assert_eq!(driver.select_file(pdf("results.pdf")), WorkflowStatus::Ready);
    assert!(driver.message().is_empty());
}
