//! Layout Engine Types
//!
//! Jobs handed to the external layout engine and the per-page descriptors it returns.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default processing profile
pub const DEFAULT_PROMPT_MODE: &str = "prompt_layout_all_en";

/// Image parsing job
#[derive(Debug, Clone)]
pub struct ImageJob {
    /// Absolute path of the staged upload
    pub input_path: PathBuf,
    /// Logical base name (`api_image`), logged only: the CLI names its
    /// outputs after the input file's stem
    pub filename: String,
    pub prompt_mode: String,
    /// Directory the engine writes its artifacts into
    pub save_dir: PathBuf,
    pub fitz_preprocess: bool,
}

/// PDF parsing job
#[derive(Debug, Clone)]
pub struct PdfJob {
    pub input_path: PathBuf,
    /// Logical base name (`api_pdf`), logged only: the CLI names its
    /// outputs after the input file's stem
    pub filename: String,
    pub prompt_mode: String,
    pub save_dir: PathBuf,
}

/// Per-page descriptor produced by the engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// Engine-assigned page number (PDFs only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_no: Option<u32>,
    /// Path to the page's layout-info JSON document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_info_path: Option<PathBuf>,
    /// Anything else the engine reports (markdown paths, image sizes, ...)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Layout engine error types
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine not available: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Failed(String),

    #[error("engine produced no result manifest at {}", .0.display())]
    MissingOutput(PathBuf),

    #[error("invalid engine output: {0}")]
    InvalidOutput(String),

    #[error("engine returned no results")]
    NoResults,
}
