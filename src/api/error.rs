//! HTTP mapping for `DomainError`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::DomainError;

impl DomainError {
    pub fn status(&self) -> StatusCode {
        match self {
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::Conflict(_) => StatusCode::CONFLICT,
            DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::BotCheckRequired => StatusCode::PRECONDITION_REQUIRED,
            DomainError::Database(_) | DomainError::Storage(_) | DomainError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Text safe to show a client; server-side failures stay in the log
    fn public_message(&self) -> String {
        match self {
            DomainError::Database(_) | DomainError::Storage(_) | DomainError::Internal(_) => {
                tracing::error!("{}", self);
                "An internal error occurred".to_string()
            }
            DomainError::Validation(msg)
            | DomainError::Conflict(msg)
            | DomainError::Unauthorized(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({ "error": self.public_message() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(DomainError::not_found("Product").status(), StatusCode::NOT_FOUND);
        assert_eq!(DomainError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(DomainError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(DomainError::BotCheckRequired.status(), StatusCode::PRECONDITION_REQUIRED);
        assert_eq!(
            DomainError::Storage("disk".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_details_are_hidden() {
        assert_eq!(
            DomainError::Database("no such table: users".into()).public_message(),
            "An internal error occurred"
        );
        assert_eq!(
            DomainError::validation("Passwords do not match").public_message(),
            "Passwords do not match"
        );
        assert_eq!(DomainError::not_found("Supplier").public_message(), "Supplier not found");
    }
}
