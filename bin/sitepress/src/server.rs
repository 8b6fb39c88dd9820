//! Embedded preview server for the exported site

use std::path::Path;

use axum::Router;
use sitepress_generator::export::NOT_FOUND_FILE;
use tower_http::services::{ServeDir, ServeFile};

/// Create the preview server router.
///
/// Serves the output directory, answering unknown paths with the exported
/// not-found page.
pub fn create_router(output_dir: &Path) -> Router {
    let not_found = ServeFile::new(output_dir.join(NOT_FOUND_FILE));
    Router::new().fallback_service(ServeDir::new(output_dir).not_found_service(not_found))
}
