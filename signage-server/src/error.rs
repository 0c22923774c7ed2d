use crate::repository::ContentError;
use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Errors surfaced by API handlers. Only 404 and 500 are ever produced;
/// the cause of a 500 is logged here and never sent to the client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    pub fn internal(cause: impl std::fmt::Display, context: &'static str) -> Self {
        tracing::error!("{}: {}", context, cause);
        ApiError::Internal(context)
    }

    pub fn from_store(err: StoreError, context: &'static str) -> Self {
        match err {
            StoreError::NotFound(kind) => ApiError::NotFound(format!("{} not found", kind)),
            other => ApiError::internal(other, context),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Attaches the per-operation message used when a failure becomes a 500.
pub trait ApiContext<T> {
    fn api_context(self, context: &'static str) -> Result<T, ApiError>;
}

impl<T> ApiContext<T> for Result<T, StoreError> {
    fn api_context(self, context: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::from_store(e, context))
    }
}

impl<T> ApiContext<T> for Result<T, ContentError> {
    fn api_context(self, context: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| match e {
            ContentError::Store(store) => ApiError::from_store(store, context),
            ContentError::Invalid(reason) => ApiError::internal(reason, context),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_found: Result<(), _> = Err(StoreError::NotFound("Screen"));
        let err = not_found.api_context("Failed to fetch screen").unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Screen not found");

        let io: Result<(), _> = Err(StoreError::Io(std::io::Error::other("disk gone")));
        let err = io.api_context("Failed to fetch screens").unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Failed to fetch screens");

        let invalid: Result<(), _> = Err(ContentError::Invalid("missing 'name'".to_string()));
        let err = invalid.api_context("Failed to create content").unwrap_err();
        assert_eq!(err.to_string(), "Failed to create content");
    }
}
