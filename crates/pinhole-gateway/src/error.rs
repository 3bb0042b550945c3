use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pinhole_core::ShortenerError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Shortener(#[from] ShortenerError),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl AppError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Shortener(err) => match err {
                ShortenerError::InvalidUrl(_) => (StatusCode::BAD_REQUEST, "invalid_url"),
                ShortenerError::InvalidAlias(_) => (StatusCode::BAD_REQUEST, "invalid_alias"),
                ShortenerError::AliasTaken(_) => (StatusCode::CONFLICT, "alias_taken"),
                ShortenerError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                ShortenerError::Expired(_) => (StatusCode::GONE, "expired"),
                ShortenerError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
                ShortenerError::DuplicateCode(_)
                | ShortenerError::CodeSpaceExhausted(_)
                | ShortenerError::StoreUnavailable(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else if status == StatusCode::UNAUTHORIZED {
            warn!(error = %self, "request rejected");
        }

        let body = ErrorBody {
            error: kind,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
