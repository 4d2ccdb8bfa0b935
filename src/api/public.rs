//! Public API types

use axum::response::{IntoResponse, Response};
use http::StatusCode;

use crate::ai::chat::SubmitError;
use crate::openai::GatewayError;

// Errors

pub struct ApiError(anyhow::Error);

impl ApiError {
    fn status(&self) -> StatusCode {
        if let Some(err) = self.0.downcast_ref::<GatewayError>() {
            return match err {
                GatewayError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::BAD_GATEWAY,
            };
        }
        match self.0.downcast_ref::<SubmitError>() {
            Some(SubmitError::Busy) => StatusCode::CONFLICT,
            Some(SubmitError::EmptyMessage) => StatusCode::UNPROCESSABLE_ENTITY,
            None => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert `ApiError` into an Axum compatible response.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!("{}", self.0);
        } else {
            tracing::debug!("Rejected request: {}", self.0);
        }

        (status, format!("Something went wrong: {}", self.0)).into_response()
    }
}

/// Enables using `?` on functions that return `Result<_,
/// anyhow::Error>` to turn them into `Result<_, ApiError>`
impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

// Re-export public types from each route

pub mod gateway {
    pub use crate::api::routes::gateway::public::*;
}

pub mod sessions {
    pub use crate::api::routes::sessions::public::*;
}
