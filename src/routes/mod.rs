// Route exports
pub mod sizing;

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use crate::models::ErrorResponse;
use crate::services::SizingError;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(sizing::configure),
    );
}

impl ResponseError for SizingError {
    fn status_code(&self) -> StatusCode {
        match self {
            SizingError::Validation(_) => StatusCode::BAD_REQUEST,
            SizingError::Auth(_) => StatusCode::UNAUTHORIZED,
            SizingError::Forbidden(_) => StatusCode::FORBIDDEN,
            SizingError::NotFound(_) => StatusCode::NOT_FOUND,
            SizingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error = match self {
            SizingError::Validation(_) => "validation_error",
            SizingError::Auth(_) => "auth_error",
            SizingError::Forbidden(_) => "forbidden",
            SizingError::NotFound(_) => "not_found",
            SizingError::Storage(e) => {
                tracing::error!("Storage failure: {}", e);
                "storage_error"
            }
        };

        // Storage details stay in the log
        let message = match self {
            SizingError::Storage(_) => "Internal storage error".to_string(),
            other => other.to_string(),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: error.to_string(),
            message,
            status_code: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::StoreError;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            SizingError::Validation("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(SizingError::Auth("x".to_string()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(SizingError::NotFound("x".to_string()).status_code(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_storage_error_hides_details() {
        let err = SizingError::from(StoreError::SqlxError(sqlx::Error::Protocol(
            "relation \"size_rules\" does not exist".to_string(),
        )));
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = actix_web::body::to_bytes(response.into_body()).await.unwrap();
        let body: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.error, "storage_error");
        assert_eq!(body.message, "Internal storage error");
        assert!(!body.message.contains("size_rules"));
    }

    #[test]
    fn test_client_errors_keep_message() {
        let response = SizingError::Validation("no measurements".to_string()).error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
