//! Multipart form reading
//!
//! Reads the `file` field and the optional `prompt_mode` / `fitz_preprocess`
//! text fields of a parse request. Unknown fields are skipped.

use axum::extract::Multipart;

use super::types::{RawUpload, UploadError, UploadForm};

/// Drain a multipart body into an [`UploadForm`].
pub async fn read_form(mut multipart: Multipart) -> Result<UploadForm, UploadError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" if form.file.is_none() => {
                let filename = field.file_name().map(|s| s.to_string());
                let content = field.bytes().await?;

                tracing::debug!(
                    filename = ?filename,
                    bytes = content.len(),
                    "Received file field"
                );

                form.file = Some(RawUpload { filename, content });
            }
            "prompt_mode" => form.prompt_mode = Some(field.text().await?),
            "fitz_preprocess" => form.fitz_preprocess = Some(field.text().await?),
            _ => tracing::debug!(field = %name, "Ignoring multipart field"),
        }
    }

    Ok(form)
}
