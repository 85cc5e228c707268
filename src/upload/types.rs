//! Upload Types
//!
//! Uploaded files, accepted formats, request options and validation errors.

use axum::body::Bytes;
use axum::http::StatusCode;
use serde::Deserialize;

use crate::engine::DEFAULT_PROMPT_MODE;

pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png"];
pub const PDF_EXTENSIONS: &[&str] = &[".pdf"];

/// Document family, decided by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Pdf,
}

impl FileKind {
    /// Resolve a lower-cased extension (with leading dot)
    pub fn from_extension(extension: &str) -> Option<Self> {
        if IMAGE_EXTENSIONS.contains(&extension) {
            Some(Self::Image)
        } else if PDF_EXTENSIONS.contains(&extension) {
            Some(Self::Pdf)
        } else {
            None
        }
    }

    /// Base name the engine uses for its output files
    pub fn logical_filename(self) -> &'static str {
        match self {
            Self::Image => "api_image",
            Self::Pdf => "api_pdf",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Pdf => "pdf",
        }
    }
}

/// Allow-list applied by an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    Image,
    Pdf,
    /// Union of every supported format
    Any,
}

impl Accept {
    pub fn allows(self, kind: FileKind) -> bool {
        matches!(
            (self, kind),
            (Self::Any, _) | (Self::Image, FileKind::Image) | (Self::Pdf, FileKind::Pdf)
        )
    }

    fn rejection(self) -> &'static str {
        match self {
            Self::Image => "Invalid image format. Supported: .jpg, .jpeg, .png",
            Self::Pdf => "Invalid PDF format. Only .pdf files accepted",
            Self::Any => "Unsupported file format",
        }
    }
}

/// File field as received from the transport, before validation
#[derive(Debug, Clone)]
pub struct RawUpload {
    pub filename: Option<String>,
    pub content: Bytes,
}

/// Everything read from a multipart parse request
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub file: Option<RawUpload>,
    pub prompt_mode: Option<String>,
    pub fitz_preprocess: Option<String>,
}

/// Validated upload
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    /// Lower-cased, with leading dot
    pub extension: String,
    pub kind: FileKind,
    pub content: Bytes,
}

/// Query string parameters of the parse endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParseQuery {
    pub prompt_mode: Option<String>,
    pub fitz_preprocess: Option<String>,
}

/// Processing options handed to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub prompt_mode: String,
    pub fitz_preprocess: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            prompt_mode: DEFAULT_PROMPT_MODE.to_string(),
            fitz_preprocess: false,
        }
    }
}

impl ParseOptions {
    /// Merge query parameters with form fields; form fields win.
    pub fn resolve(query: &ParseQuery, form: &UploadForm) -> Result<Self, UploadError> {
        let prompt_mode = form
            .prompt_mode
            .as_deref()
            .or(query.prompt_mode.as_deref())
            .map(str::trim)
            .filter(|mode| !mode.is_empty())
            .unwrap_or(DEFAULT_PROMPT_MODE)
            .to_string();

        let fitz_preprocess = match form.fitz_preprocess.as_deref().or(query.fitz_preprocess.as_deref()) {
            Some(value) => parse_flag(value).ok_or_else(|| UploadError::InvalidParameter {
                name: "fitz_preprocess",
                value: value.to_string(),
            })?,
            None => false,
        };

        Ok(Self {
            prompt_mode,
            fitz_preprocess,
        })
    }
}

/// Parse a boolean flag the way HTML forms and query strings spell them
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "t" | "y" => Some(true),
        "false" | "0" | "no" | "off" | "f" | "n" => Some(false),
        _ => None,
    }
}

/// Upload error types
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("No file uploaded")]
    MissingFile,

    #[error("Missing filename")]
    MissingFilename,

    #[error("Invalid filename format")]
    InvalidFilename,

    #[error("{}", .0.rejection())]
    UnsupportedFormat(Accept),

    #[error("Uploaded file is empty")]
    EmptyFile,

    #[error("Invalid value for {name}: {value:?}")]
    InvalidParameter { name: &'static str, value: String },

    #[error("Invalid query string: {0}")]
    InvalidQuery(String),

    #[error("Failed to read upload: {message}")]
    Multipart { status: StatusCode, message: String },
}

impl UploadError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Multipart { status, .. } if *status == StatusCode::PAYLOAD_TOO_LARGE => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for UploadError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        Self::Multipart {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl From<axum::extract::rejection::QueryRejection> for UploadError {
    fn from(rejection: axum::extract::rejection::QueryRejection) -> Self {
        Self::InvalidQuery(rejection.body_text())
    }
}

impl From<axum::extract::multipart::MultipartRejection> for UploadError {
    fn from(rejection: axum::extract::multipart::MultipartRejection) -> Self {
        Self::Multipart {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}
