//! Upload validation
//!
//! Checks run in a fixed order: file present, filename present, filename well
//! formed, extension allowed, content non-empty.

use std::path::Path;

use super::types::{Accept, FileKind, RawUpload, UploadError, UploadedFile};

/// Validate a received file field against an endpoint's allow-list.
pub fn validate(file: Option<RawUpload>, accept: Accept) -> Result<UploadedFile, UploadError> {
    let file = file.ok_or(UploadError::MissingFile)?;

    let filename = match file.filename {
        Some(name) if !name.is_empty() => name,
        _ => return Err(UploadError::MissingFilename),
    };

    let extension = extension_of(&filename)?;
    let kind = FileKind::from_extension(&extension)
        .filter(|kind| accept.allows(*kind))
        .ok_or(UploadError::UnsupportedFormat(accept))?;

    if file.content.is_empty() {
        return Err(UploadError::EmptyFile);
    }

    Ok(UploadedFile {
        filename,
        extension,
        kind,
        content: file.content,
    })
}

/// Lower-cased extension of the final path component, with its leading dot.
///
/// Returns an empty string when the name has no extension.
pub fn extension_of(filename: &str) -> Result<String, UploadError> {
    if filename.contains('\0') {
        return Err(UploadError::InvalidFilename);
    }

    let name = Path::new(filename)
        .file_name()
        .ok_or(UploadError::InvalidFilename)?;

    Ok(Path::new(name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default())
}
