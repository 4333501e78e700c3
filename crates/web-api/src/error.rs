use application::ApplicationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::{RegistryError, SubmitError};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        let status = match &error {
            ApplicationError::Registry(RegistryError::DuplicateConnection(_)) => {
                StatusCode::CONFLICT
            }
            ApplicationError::Registry(RegistryError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApplicationError::Submit(SubmitError::UnknownSender(_)) => StatusCode::FORBIDDEN,
            ApplicationError::Submit(SubmitError::MessageTooLong { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
        };
        ApiError::new(status, error.code(), error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
