use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::gateway::{Feature, GatewayError};
use crate::llm::LLMError;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The request could not be read at all.
    #[error("{0}")]
    BadRequest(String),
    /// A feature failed while handling the request.
    #[error("{error}")]
    Feature {
        feature: Feature,
        #[source]
        error: GatewayError,
    },
}

impl ApiError {
    pub fn feature(feature: Feature, error: GatewayError) -> Self {
        ApiError::Feature { feature, error }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Feature { error, .. } => match error {
                GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
                GatewayError::Llm(llm) if is_overloaded(llm) => StatusCode::SERVICE_UNAVAILABLE,
                GatewayError::Llm(_) | GatewayError::Template(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

fn is_overloaded(error: &LLMError) -> bool {
    match error {
        LLMError::Overloaded { .. } => true,
        LLMError::DegradationFailed(inner) => is_overloaded(inner),
        _ => false,
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: bool,
    success: bool,
    message: String,
    details: String,
}

impl ApiError {
    fn body(&self) -> ErrorBody {
        let (message, details) = match self {
            ApiError::BadRequest(reason)
            | ApiError::Feature {
                error: GatewayError::BadRequest(reason),
                ..
            } => (reason.clone(), reason.clone()),
            // The photo route reports a fixed headline and puts the cause in `details`.
            ApiError::Feature {
                feature: Feature::PhotoTransform,
                error,
            } => (
                Feature::PhotoTransform.unavailable_details().to_string(),
                error.to_string(),
            ),
            ApiError::Feature { feature, error } => {
                (error.to_string(), feature.unavailable_details().to_string())
            }
        };
        ErrorBody {
            error: true,
            success: false,
            message,
            details,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %self, "Request failed");
        }
        (status, Json(self.body())).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
