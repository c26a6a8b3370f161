pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws_handler;

use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use state::AppState;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// Re-export the handlers to make them easily accessible
// to the binary that builds the web server.
pub use rest::{
    delete_document_handler, get_document_handler, list_documents_handler, outline_handler,
    replace_document_handler, share_handler, upload_document_handler,
};
pub use ws_handler::ws_handler;

/// Builds the API router. CORS and the Swagger UI are layered on by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    let body_limit = app_state.config.max_upload_bytes;
    Router::new()
        .route(
            "/documents",
            get(list_documents_handler).post(upload_document_handler),
        )
        .route(
            "/documents/{id}",
            get(get_document_handler)
                .put(replace_document_handler)
                .delete(delete_document_handler),
        )
        .route("/documents/{id}/outline", get(outline_handler))
        .route("/share", get(share_handler))
        .route("/ws", get(ws_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
