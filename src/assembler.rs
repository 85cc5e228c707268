//! Result assembly
//!
//! Turns engine page descriptors into the JSON payload returned to clients.
//! A missing or malformed layout file never fails the request; the page is
//! reported with an empty layout object instead.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::{EngineError, PageResult};
use crate::upload::FileKind;

/// Layout of a single page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayoutResult {
    pub page_no: Option<u32>,
    pub full_layout_info: Value,
}

/// Response body of every parse endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResponse {
    pub success: bool,
    pub total_pages: usize,
    pub results: Vec<PageLayoutResult>,
}

/// Build the response for `kind` from the engine's descriptors.
///
/// Images report only the first descriptor, always as page 0. PDFs report every
/// descriptor in engine order with the engine's page number.
pub async fn assemble(
    kind: FileKind,
    pages: &[PageResult],
    output_dir: &Path,
) -> Result<ParseResponse, EngineError> {
    let results = match kind {
        FileKind::Image => {
            let first = pages.first().ok_or(EngineError::NoResults)?;
            if pages.len() > 1 {
                tracing::debug!(descriptors = pages.len(), "Image produced several descriptors, reporting the first");
            }
            vec![PageLayoutResult {
                page_no: Some(0),
                full_layout_info: load_layout_info(first.layout_info_path.as_deref(), output_dir).await,
            }]
        }
        FileKind::Pdf => {
            let mut results = Vec::with_capacity(pages.len());
            for page in pages {
                results.push(PageLayoutResult {
                    page_no: page.page_no,
                    full_layout_info: load_layout_info(page.layout_info_path.as_deref(), output_dir)
                        .await,
                });
            }
            results
        }
    };

    Ok(ParseResponse {
        success: true,
        total_pages: pages.len(),
        results,
    })
}

/// Read a layout-info document, or `{}` when it is absent or unreadable.
///
/// Relative paths resolve against `output_dir`.
pub async fn load_layout_info(path: Option<&Path>, output_dir: &Path) -> Value {
    let empty = Value::Object(Default::default());

    let Some(path) = path else {
        return empty;
    };
    let path = output_dir.join(path);

    let content = match tokio::fs::read(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "Layout info file not found");
            return empty;
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read layout info file");
            return empty;
        }
    };

    match serde_json::from_slice(&content) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to parse layout info file");
            empty
        }
    }
}
