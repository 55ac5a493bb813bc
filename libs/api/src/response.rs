use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::error;

pub enum ApiError {
    ClientError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status_code, message) = match self {
            ApiError::ClientError(message) => (StatusCode::BAD_REQUEST, message),
        };
        (status_code, Json(json!({ "error": message }))).into_response()
    }
}

pub type ApiResponse<T> = Result<T, ApiError>;

pub trait IntoApiResponse<T> {
    fn into_response(self, message: &str) -> ApiResponse<T>;
}

impl<T> IntoApiResponse<T> for Result<T, serde_json::Error> {
    fn into_response(self, message: &str) -> ApiResponse<T> {
        self.map_err(|e| {
            error!(task = message, err = e.to_string());
            ApiError::ClientError(format!("{}: {}", message, e))
        })
    }
}

impl<T> IntoApiResponse<T> for Option<T> {
    fn into_response(self, message: &str) -> ApiResponse<T> {
        self.ok_or_else(|| {
            error!(task = message);
            ApiError::ClientError(message.to_string())
        })
    }
}
