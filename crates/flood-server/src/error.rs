use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use flood_engine::EngineError;
use serde_json::json;

/// Errors a handler can answer with
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Unauthorized")]
    Unauthorized,

    /// No shared secret configured on the server
    #[error("Server configuration error")]
    MissingSecret,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::MissingSecret | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "Invalid request",
            ApiError::InvalidJson(_) => "Invalid JSON",
            ApiError::Unauthorized => "Unauthorized",
            ApiError::MissingSecret => "Server configuration error",
            ApiError::Internal(_) => "Internal error",
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Validation(msg) => ApiError::BadRequest(msg),
            EngineError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = match &self {
            ApiError::Unauthorized | ApiError::MissingSecret => json!({ "error": self.title() }),
            _ => json!({ "error": self.title(), "details": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flood_core::StoreError;

    #[test]
    fn engine_errors_map_to_status() {
        let e: ApiError = EngineError::Validation("station name required".into()).into();
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);

        let e: ApiError = EngineError::Store(StoreError::Backend("down".into())).into();
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(e.to_string().contains("down"));
    }

    #[test]
    fn secret_errors_are_distinct() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::MissingSecret.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
