//! Configuration for the upload-and-convert workflow.
//!
//! Everything the workflow needs to know about its environment lives in
//! [`ConverterConfig`], built via [`ConverterConfigBuilder`]: where the
//! conversion service is, which scheme/semester the upload belongs to, where
//! the spreadsheet should be saved, and who wants to hear about status
//! changes.

use crate::context::SubmissionContext;
use crate::error::ConvertError;
use crate::progress::StatusCallback;
use reqwest::Url;
use std::fmt;
use std::path::PathBuf;

/// Base URL of a locally running conversion service.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Path of the conversion endpoint on the service.
pub const DEFAULT_ENDPOINT_PATH: &str = "/generate-excel/";

/// Configuration for a conversion workflow.
///
/// Built via [`ConverterConfig::builder()`] or using
/// [`ConverterConfig::default()`].
///
/// # Example
/// ```rust
/// use result2xlsx::ConverterConfig;
///
/// let config = ConverterConfig::builder()
///     .base_url("https://results.example.edu")
///     .scheme("2024")
///     .semester("S3")
///     .output_dir("out")
///     .build()
///     .unwrap();
/// assert_eq!(
///     config.endpoint().unwrap().as_str(),
///     "https://results.example.edu/generate-excel/"
/// );
/// ```
#[derive(Clone)]
pub struct ConverterConfig {
    /// Scheme, host and optional port of the conversion service.
    /// Default: `http://localhost:8000`.
    pub base_url: String,

    /// Path of the conversion endpoint. Default: `/generate-excel/`.
    pub endpoint_path: String,

    /// Scheme/semester selection. Empty means the context-free deployment.
    pub context: SubmissionContext,

    /// Directory the downloaded spreadsheet is written into. Default: `.`.
    pub output_dir: PathBuf,

    /// Replace the sniffed MIME type of files loaded from disk.
    pub mime_override: Option<String>,

    /// `User-Agent` header sent with every upload.
    pub user_agent: String,

    /// Optional presentation hook, notified on every status change.
    pub status_callback: Option<StatusCallback>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_string(),
            context: SubmissionContext::default(),
            output_dir: PathBuf::from("."),
            mime_override: None,
            user_agent: format!("result2xlsx/{}", env!("CARGO_PKG_VERSION")),
            status_callback: None,
        }
    }
}

impl fmt::Debug for ConverterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterConfig")
            .field("base_url", &self.base_url)
            .field("endpoint_path", &self.endpoint_path)
            .field("context", &self.context)
            .field("output_dir", &self.output_dir)
            .field("mime_override", &self.mime_override)
            .field("user_agent", &self.user_agent)
            .field(
                "status_callback",
                &self.status_callback.as_ref().map(|_| "<dyn WorkflowStatusCallback>"),
            )
            .finish()
    }
}

impl ConverterConfig {
    /// Create a new builder for `ConverterConfig`.
    pub fn builder() -> ConverterConfigBuilder {
        ConverterConfigBuilder {
            config: Self::default(),
        }
    }

    /// Full URL the upload is POSTed to.
    pub fn endpoint(&self) -> Result<Url, ConvertError> {
        let joined = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint_path.trim_start_matches('/')
        );
        let url = Url::parse(&joined).map_err(|e| ConvertError::InvalidEndpoint {
            url: joined.clone(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConvertError::InvalidEndpoint {
                url: joined,
                reason: format!("unsupported scheme '{other}', expected http or https"),
            }),
        }
    }
}

/// Builder for [`ConverterConfig`].
#[derive(Debug)]
pub struct ConverterConfigBuilder {
    config: ConverterConfig,
}

impl ConverterConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.config.endpoint_path = path.into();
        self
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.config.context.scheme = Some(scheme.into());
        self
    }

    pub fn semester(mut self, semester: impl Into<String>) -> Self {
        self.config.context.semester = Some(semester.into());
        self
    }

    pub fn context(mut self, context: SubmissionContext) -> Self {
        self.config.context = context;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn mime_override(mut self, mime: impl Into<String>) -> Self {
        self.config.mime_override = Some(mime.into());
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn status_callback(mut self, cb: StatusCallback) -> Self {
        self.config.status_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConverterConfig, ConvertError> {
        let c = &self.config;
        if c.base_url.trim().is_empty() {
            return Err(ConvertError::InvalidConfig("Base URL must not be empty".into()));
        }
        if c.user_agent.trim().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "User agent must not be empty".into(),
            ));
        }
        for (field, value) in [("scheme", &c.context.scheme), ("semester", &c.context.semester)] {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(ConvertError::InvalidConfig(format!(
                    "{field} must not be blank when given"
                )));
            }
        }
        c.endpoint()?;
        Ok(self.config)
    }
}
