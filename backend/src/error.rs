use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use shared::ValidationError;
use thiserror::Error;

use crate::store::StoreError;

/// Service-level errors, each with a fixed HTTP mapping.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidField(#[from] ValidationError),
    #[error("task '{0}' not found")]
    NotFound(String),
    #[error("task '{0}' already exists")]
    Conflict(String),
    #[error("task store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
    detail: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidField(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::InvalidField(_) => "invalid_field",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let field = match &self {
            Self::InvalidField(err) => Some(err.field),
            _ => None,
        };
        let body = ErrorBody {
            error: self.kind(),
            field,
            detail: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(detail) => Self::StoreUnavailable(detail),
            StoreError::Malformed(detail) => Self::Internal(detail),
        }
    }
}

/// A body axum could not read as JSON reports like any other bad field.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidField(ValidationError::new("body", rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_fixed() {
        let invalid: ApiError = ValidationError::new("duration", "out of range").into();
        assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            ApiError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::StoreUnavailable("down".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Internal("bug".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn store_errors_map_by_kind() {
        let unavailable: ApiError = StoreError::Unavailable("refused".into()).into();
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
        let malformed: ApiError = StoreError::Malformed("bad json".into()).into();
        assert_eq!(malformed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
