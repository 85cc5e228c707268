//! dotsOCR Gateway Library
//!
//! HTTP front end for the dotsOCR layout engine. Uploaded images and PDFs are
//! validated, staged in a per-request scratch workspace, handed to the engine,
//! and the per-page layout JSON it produces is returned to the client.
//!
//! # Modules
//!
//! - `upload`: multipart reading, option parsing and validation
//! - `workspace`: scratch directories with guaranteed cleanup
//! - `engine`: the external engine interface and its CLI-backed implementation
//! - `assembler`: per-page layout files to response payload
//! - `routes`: axum handlers

pub mod assembler;
pub mod config;
pub mod engine;
pub mod error;
pub mod routes;
pub mod state;
pub mod upload;
pub mod workspace;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the full application router
pub fn app(state: AppState) -> Router {
    let body_limit = state.config().upload.max_upload_bytes;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest(
            "/parse",
            routes::parse::router().layer(DefaultBodyLimit::max(body_limit)),
        )
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
