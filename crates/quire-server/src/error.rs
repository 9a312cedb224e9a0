//! Error types for the HTTP server.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use quire_views::ViewError;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// No route matches the request.
    #[error("No route for {0}")]
    NotFound(String),

    /// A view failed while rendering.
    #[error("View for {} failed: {source}", page.display())]
    View {
        page: PathBuf,
        #[source]
        source: ViewError,
    },

    /// A view produced a response that cannot be sent.
    #[error("View for {} produced an invalid response: {message}", page.display())]
    InvalidResponse { page: PathBuf, message: String },
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match &self {
            Self::NotFound(path) => {
                tracing::debug!(path = %path, "No matching route");
                (StatusCode::NOT_FOUND, "Not Found").into_response()
            }
            Self::View { page, source } => {
                tracing::error!(page = %page.display(), error = %source, "View failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
            Self::InvalidResponse { page, message } => {
                tracing::error!(page = %page.display(), error = %message, "Invalid view response");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}
