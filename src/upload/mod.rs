//! Upload Module
//!
//! Turns a multipart parse request into a validated [`UploadedFile`] plus the
//! [`ParseOptions`] for the engine.

mod form;
mod types;
mod validator;

pub use form::read_form;
pub use types::{
    parse_flag, Accept, FileKind, ParseOptions, ParseQuery, RawUpload, UploadError, UploadForm,
    UploadedFile, IMAGE_EXTENSIONS, PDF_EXTENSIONS,
};
pub use validator::{extension_of, validate};
