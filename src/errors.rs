use std::time::Duration;

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::logging::SecurityEvent;
use crate::policy::PolicyViolation;

/// Every handler and middleware rejection on the HTTP surface.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Policy(#[from] PolicyViolation),

    #[error("invalid JSON payload: {0}")]
    InvalidJson(String),

    #[error("unsupported media type: expected application/json")]
    UnsupportedMediaType,

    #[error("request body too large")]
    PayloadTooLarge,

    #[error("CSRF token missing")]
    CsrfMissing,

    #[error("CSRF token does not match")]
    CsrfMismatch,

    #[error("rate limit exceeded; please try again later")]
    RateLimitExceeded { retry_after: Option<Duration> },
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Policy(_) | AppError::InvalidJson(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::CsrfMissing | AppError::CsrfMismatch => StatusCode::FORBIDDEN,
            AppError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Machine-readable code clients can branch on.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            AppError::Policy(violation) => Some(violation.code()),
            AppError::Validation(_) => Some("invalid"),
            AppError::CsrfMissing | AppError::CsrfMismatch => Some("csrf_failed"),
            AppError::RateLimitExceeded { .. } => Some("rate_limited"),
            _ => None,
        }
    }

    fn security_event(&self) -> Option<SecurityEvent> {
        match self {
            AppError::CsrfMissing => Some(SecurityEvent::CsrfTokenMissing),
            AppError::CsrfMismatch => Some(SecurityEvent::CsrfTokenMismatch),
            _ => None,
        }
    }

    fn log(&self, status: StatusCode) {
        if let Some(event) = self.security_event() {
            crate::log_security_event!(event, status_code = %status, "Request refused by CSRF check");
        } else if !matches!(self, AppError::RateLimitExceeded { .. }) {
            tracing::warn!(error = %self, status_code = %status, "Client error");
        }
    }

    fn retry_after_header(&self) -> Option<HeaderValue> {
        match self {
            AppError::RateLimitExceeded {
                retry_after: Some(wait),
            } => HeaderValue::from_str(&wait.as_secs().max(1).to_string()).ok(),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        self.log(status);

        let mut response = (
            status,
            Json(ErrorBody {
                error: self.to_string(),
                code: self.code(),
            }),
        )
            .into_response();

        if let Some(value) = self.retry_after_header() {
            response.headers_mut().insert(RETRY_AFTER, value);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::Value;

    use super::*;

    async fn body_of(error: AppError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_policy_violation_is_bad_request_with_code() {
        let (status, body) = body_of(PolicyViolation::TooShort.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "password_too_short");
        assert!(body["error"].as_str().unwrap().contains("at least 8 characters"));
    }

    #[test]
    fn test_csrf_errors_are_forbidden() {
        assert_eq!(AppError::CsrfMissing.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::CsrfMismatch.code(), Some("csrf_failed"));
        assert_eq!(
            AppError::CsrfMismatch.security_event(),
            Some(SecurityEvent::CsrfTokenMismatch)
        );
    }

    #[test]
    fn test_rate_limit_sets_retry_after() {
        let response = AppError::RateLimitExceeded {
            retry_after: Some(Duration::from_millis(2500)),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "2");

        let response = AppError::RateLimitExceeded { retry_after: None }.into_response();
        assert!(response.headers().get(RETRY_AFTER).is_none());
    }

    #[tokio::test]
    async fn test_validation_message_is_exposed() {
        let (status, body) =
            body_of(AppError::Validation("the two password fields didn't match".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("didn't match"));
    }

    #[test]
    fn test_every_rejection_is_a_client_error() {
        let errors = [
            AppError::Validation("bad".into()),
            AppError::Policy(PolicyViolation::TooSimilar),
            AppError::InvalidJson("eof".into()),
            AppError::UnsupportedMediaType,
            AppError::PayloadTooLarge,
            AppError::CsrfMissing,
            AppError::CsrfMismatch,
            AppError::RateLimitExceeded { retry_after: None },
        ];
        assert!(errors.iter().all(|error| error.status_code().is_client_error()));
    }
}
