//! Service error to HTTP status mapping

use super::dto::ErrorBody;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lattia_application::IntakeServiceError;
use tracing::error;

#[derive(Debug)]
pub struct ApiError(pub IntakeServiceError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            IntakeServiceError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            IntakeServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            IntakeServiceError::AlreadyExists(_) | IntakeServiceError::Conflict(_) => {
                StatusCode::CONFLICT
            }
            IntakeServiceError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            IntakeServiceError::Turn(_) => StatusCode::BAD_GATEWAY,
            IntakeServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<IntakeServiceError> for ApiError {
    fn from(e: IntakeServiceError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{} {}", status.as_u16(), self.0);
        }
        let body = ErrorBody {
            detail: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattia_application::{GatewayError, RunTurnError, StoreError};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (IntakeServiceError::RateLimited(1), StatusCode::TOO_MANY_REQUESTS),
            (IntakeServiceError::NotFound(1), StatusCode::NOT_FOUND),
            (
                IntakeServiceError::AlreadyExists("ana".to_string()),
                StatusCode::CONFLICT,
            ),
            (
                IntakeServiceError::Conflict("stale".to_string()),
                StatusCode::CONFLICT,
            ),
            (
                IntakeServiceError::InvalidInput("empty".to_string()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                IntakeServiceError::Turn(RunTurnError::Gateway(GatewayError::Timeout)),
                StatusCode::BAD_GATEWAY,
            ),
            (
                IntakeServiceError::Store(StoreError::Database("disk".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(ApiError(error).status(), expected);
        }
    }

    #[tokio::test]
    async fn test_error_body_has_detail() {
        let response = ApiError(IntakeServiceError::NotFound(7)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["detail"], "Profile 7 not found");
    }
}
