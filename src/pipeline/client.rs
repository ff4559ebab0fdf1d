//! Upload: send the selected document to the conversion service.
//!
//! This is the only stage with network I/O. It makes exactly one attempt per
//! request with no timeout and no retry, and it never returns an error:
//! anything that goes wrong on the wire becomes
//! [`RawOutcome::TransportFailure`], and any HTTP answer (success or not)
//! becomes [`RawOutcome::Response`] for [`super::interpret`] to judge.
//!
//! ## Request Layout
//!
//! `POST <base_url><endpoint_path>` with a `multipart/form-data` body:
//!
//! | Field      | When                     | Content                           |
//! |------------|--------------------------|-----------------------------------|
//! | `file`     | always                   | document bytes, name and MIME type |
//! | `scheme`   | scheme selected          | e.g. `2024`                       |
//! | `semester` | semester selected        | e.g. `S3`                         |

use crate::config::ConverterConfig;
use crate::context::SubmissionContext;
use crate::error::ConvertError;
use crate::pipeline::input::OCTET_STREAM_MIME;
use crate::pipeline::validate::SelectedFile;
use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use std::future::Future;
use tracing::{debug, info, warn};

/// One upload, frozen at the moment it is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    file: SelectedFile,
    scheme: Option<String>,
    semester: Option<String>,
}

impl ConversionRequest {
    pub fn new(file: SelectedFile, context: &SubmissionContext) -> Self {
        Self {
            file,
            scheme: context.scheme.clone(),
            semester: context.semester.clone(),
        }
    }

    pub fn file(&self) -> &SelectedFile {
        &self.file
    }

    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    pub fn semester(&self) -> Option<&str> {
        self.semester.as_deref()
    }
}

/// What came back from one submission, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawOutcome {
    /// The service answered. Any status code, including failures.
    Response {
        status: u16,
        headers: HeaderMap,
        body: Vec<u8>,
    },
    /// The request never produced a complete answer.
    TransportFailure(String),
}

/// Anything that can carry a [`ConversionRequest`] to a conversion service.
///
/// [`ConversionClient`] is the HTTP implementation; the workflow driver is
/// generic over this trait so it can be exercised without a network.
pub trait ConversionTransport {
    /// Submit once and report what happened. Must not retry.
    fn submit(&self, request: &ConversionRequest) -> impl Future<Output = RawOutcome> + Send;
}

/// HTTP client for the conversion endpoint.
#[derive(Debug, Clone)]
pub struct ConversionClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl ConversionClient {
    /// Build a client for the endpoint described by `config`.
    pub fn new(config: &ConverterConfig) -> Result<Self, ConvertError> {
        let endpoint = config.endpoint()?;
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ConvertError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self { http, endpoint })
    }

    /// The URL uploads are POSTed to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn send(&self, request: &ConversionRequest) -> RawOutcome {
        let form = match build_form(request) {
            Ok(form) => form,
            Err(e) => return RawOutcome::TransportFailure(format!("multipart body: {e}")),
        };

        info!(
            "Uploading '{}' ({} bytes) to {}",
            request.file().name(),
            request.file().len(),
            self.endpoint
        );

        let response = match self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("Upload to {} failed: {}", self.endpoint, e);
                return RawOutcome::TransportFailure(e.to_string());
            }
        };

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        match response.bytes().await {
            Ok(body) => {
                debug!("Received HTTP {} with {} bytes", status, body.len());
                RawOutcome::Response {
                    status,
                    headers,
                    body: body.to_vec(),
                }
            }
            Err(e) => {
                warn!("Reading response body from {} failed: {}", self.endpoint, e);
                RawOutcome::TransportFailure(e.to_string())
            }
        }
    }
}

impl ConversionTransport for ConversionClient {
    fn submit(&self, request: &ConversionRequest) -> impl Future<Output = RawOutcome> + Send {
        self.send(request)
    }
}

/// Assemble the multipart body for `request`.
///
/// A MIME type the multipart encoder cannot parse is sent as
/// `application/octet-stream`; the validator has already vouched for the
/// file.
fn build_form(request: &ConversionRequest) -> Result<Form, reqwest::Error> {
    let file = request.file();
    let part = || Part::bytes(file.bytes().to_vec()).file_name(file.name().to_string());
    let file_part = match part().mime_str(file.mime_type()) {
        Ok(p) => p,
        Err(_) => part().mime_str(OCTET_STREAM_MIME)?,
    };

    let mut form = Form::new().part("file", file_part);
    if let Some(scheme) = request.scheme() {
        form = form.text("scheme", scheme.to_string());
    }
    if let Some(semester) = request.semester() {
        form = form.text("semester", semester.to_string());
    }
    Ok(form)
}
