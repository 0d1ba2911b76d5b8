//! Maps [`AppError`] onto HTTP responses rendered with the error page.

use askama::Template;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use hof_core::error::AppError;
use hof_ui::ErrorTemplate;
use tracing::error;

#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError(AppError::ValidationError(format!("malformed form: {}", err.body_text())))
    }
}

pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::NotFound(..) => StatusCode::NOT_FOUND,
        AppError::SchemaMismatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
        AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        AppError::FileRead(_) => StatusCode::BAD_REQUEST,
        AppError::InvalidDataUrl(_) => StatusCode::BAD_REQUEST,
        AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }

        let message = self.0.to_string();
        let page = ErrorTemplate {
            title: status.canonical_reason().unwrap_or("Error"),
            actor: None,
            status: status.as_u16(),
            message: &message,
        }
        .render();

        match page {
            Ok(html) => (status, Html(html)).into_response(),
            Err(_) => (status, message).into_response(),
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
