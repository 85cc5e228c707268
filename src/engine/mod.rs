//! Layout Engine Module
//!
//! Narrow interface to the external dotsOCR layout/OCR engine. The gateway never
//! performs inference itself; it stages files, invokes the engine, and reads
//! back the per-page artifacts the engine leaves in the output directory.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dots_ocr_gateway::engine::{CommandEngine, LayoutEngine, PdfJob};
//!
//! let engine = CommandEngine::new(config.engine.clone());
//! let pages = engine.parse_pdf(&PdfJob {
//!     input_path: "/tmp/dots-input-x/upload_ab12.pdf".into(),
//!     filename: "api_pdf".to_string(),
//!     prompt_mode: "prompt_layout_all_en".to_string(),
//!     save_dir: "/tmp/dots-output-y".into(),
//! }).await?;
//! ```

mod provider;
mod types;

pub use provider::{CommandEngine, LayoutEngine};
pub use types::{EngineError, ImageJob, PageResult, PdfJob, DEFAULT_PROMPT_MODE};

#[cfg(test)]
pub(crate) use provider::mock;
