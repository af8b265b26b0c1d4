use crate::features::files::handlers::{self, FilesState};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

// Slack on top of the file size limit for the metadata and tags fields.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// File routes (require bearer authentication). Static search paths are
/// registered alongside the `{filename}` download route; axum matches the
/// literal segments first.
pub fn protected_routes(state: FilesState, max_file_size: usize) -> Router {
    Router::new()
        .route(
            "/api/upload",
            post(handlers::upload_file)
                .layer(DefaultBodyLimit::max(max_file_size + MULTIPART_OVERHEAD)),
        )
        .route("/api/files", get(handlers::list_files))
        .route("/api/files/search/tags", get(handlers::search_by_tags))
        .route(
            "/api/files/search/metadata",
            get(handlers::search_by_metadata),
        )
        .route(
            "/api/files/search/content",
            get(handlers::search_by_content),
        )
        .route("/api/files/{id}/metadata", put(handlers::update_metadata))
        .route("/api/files/{filename}", get(handlers::download_file))
        .with_state(state)
}
