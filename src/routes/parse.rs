//! Parse Routes
//!
//! HTTP endpoints that run uploads through the layout engine.
//!
//! Endpoints:
//! - POST /parse/image - Parse a .jpg/.jpeg/.png upload
//! - POST /parse/pdf - Parse a .pdf upload, one result per page
//! - POST /parse/file - Dispatch on extension to the image or PDF pipeline
//!
//! Every request runs `received -> validated -> staged -> parsed -> assembled
//! -> cleaned -> responded`. The scratch workspace is removed before the
//! response leaves the handler, on the error path as well.

use axum::{
    extract::{
        multipart::MultipartRejection, rejection::QueryRejection, Multipart, Query, State,
    },
    routing::post,
    Json, Router,
};

use crate::assembler::{assemble, ParseResponse};
use crate::engine::{ImageJob, PageResult, PdfJob};
use crate::error::Result;
use crate::state::AppState;
use crate::upload::{
    read_form, validate, Accept, FileKind, ParseOptions, ParseQuery, UploadError, UploadedFile,
};
use crate::workspace::ScratchWorkspace;

type QueryParams = std::result::Result<Query<ParseQuery>, QueryRejection>;
type MultipartBody = std::result::Result<Multipart, MultipartRejection>;

// ============================================================================
// Router
// ============================================================================

/// Create the parse router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/image", post(parse_image))
        .route("/pdf", post(parse_pdf))
        .route("/file", post(parse_file))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /parse/image
async fn parse_image(
    State(state): State<AppState>,
    query: QueryParams,
    multipart: MultipartBody,
) -> Result<Json<ParseResponse>> {
    handle(state, Accept::Image, query, multipart).await
}

/// POST /parse/pdf
async fn parse_pdf(
    State(state): State<AppState>,
    query: QueryParams,
    multipart: MultipartBody,
) -> Result<Json<ParseResponse>> {
    handle(state, Accept::Pdf, query, multipart).await
}

/// POST /parse/file
///
/// Accepts the union of image and PDF formats. The target pipeline is picked
/// from the extension once the upload has been validated.
async fn parse_file(
    State(state): State<AppState>,
    query: QueryParams,
    multipart: MultipartBody,
) -> Result<Json<ParseResponse>> {
    handle(state, Accept::Any, query, multipart).await
}

#[tracing::instrument(
    name = "parse",
    skip_all,
    fields(request_id = %uuid::Uuid::new_v4(), accept = ?accept)
)]
async fn handle(
    state: AppState,
    accept: Accept,
    query: QueryParams,
    multipart: MultipartBody,
) -> Result<Json<ParseResponse>> {
    let Query(query) = query.map_err(UploadError::from)?;
    let form = read_form(multipart.map_err(UploadError::from)?).await?;
    tracing::debug!(stage = "received");

    let options = ParseOptions::resolve(&query, &form)?;
    let upload = validate(form.file, accept)?;
    tracing::info!(
        stage = "validated",
        filename = %upload.filename,
        kind = upload.kind.as_str(),
        bytes = upload.content.len(),
        prompt_mode = %options.prompt_mode,
        fitz_preprocess = options.fitz_preprocess,
        "Parsing upload"
    );

    let response = run_pipeline(&state, &upload, &options).await?;

    tracing::info!(
        stage = "responded",
        total_pages = response.total_pages,
        "Parse complete"
    );
    Ok(Json(response))
}

// ============================================================================
// Pipeline
// ============================================================================

/// Stage a validated upload, run the engine matching its kind and assemble the
/// response. The workspace is closed before returning, whatever the outcome.
pub async fn run_pipeline(
    state: &AppState,
    upload: &UploadedFile,
    options: &ParseOptions,
) -> Result<ParseResponse> {
    let workspace =
        ScratchWorkspace::create(state.temp_root(), &upload.extension, &upload.content).await?;
    tracing::debug!(stage = "staged", input = %workspace.input_path().display());

    let outcome = parse_and_assemble(state, upload.kind, options, &workspace).await;

    workspace.close().await;
    tracing::debug!(stage = "cleaned", success = outcome.is_ok());

    outcome
}

async fn parse_and_assemble(
    state: &AppState,
    kind: FileKind,
    options: &ParseOptions,
    workspace: &ScratchWorkspace,
) -> Result<ParseResponse> {
    let pages = invoke_engine(state, kind, options, workspace).await?;
    tracing::debug!(stage = "parsed", descriptors = pages.len());

    let response = assemble(kind, &pages, workspace.output_dir()).await?;
    tracing::debug!(stage = "assembled", total_pages = response.total_pages);

    Ok(response)
}

async fn invoke_engine(
    state: &AppState,
    kind: FileKind,
    options: &ParseOptions,
    workspace: &ScratchWorkspace,
) -> Result<Vec<PageResult>> {
    let engine = state.engine();
    let input_path = workspace.input_path().to_path_buf();
    let save_dir = workspace.output_dir().to_path_buf();
    let filename = kind.logical_filename().to_string();
    let prompt_mode = options.prompt_mode.clone();

    let pages = match kind {
        FileKind::Image => {
            engine
                .parse_image(&ImageJob {
                    input_path,
                    filename,
                    prompt_mode,
                    save_dir,
                    fitz_preprocess: options.fitz_preprocess,
                })
                .await
        }
        FileKind::Pdf => {
            engine
                .parse_pdf(&PdfJob {
                    input_path,
                    filename,
                    prompt_mode,
                    save_dir,
                })
                .await
        }
    };

    pages.map_err(|e| {
        tracing::warn!(engine = engine.name(), error = %e, "Layout engine failed");
        e.into()
    })
}

// ============================================================================
// Tests
// ============================================================================
