use axum::{
    Json, Router,
    http::{StatusCode, header::SET_COOKIE},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::logging::{SanitizedEmail, SanitizedUsername, SecurityEvent};
use crate::policy::{self, Checklist, IdentityFields, RuleState, Strength};
use crate::security::csrf::{CsrfToken, require_csrf_token};
use crate::security::json::ValidatedJson;
use crate::security::rate_limit::{RateLimiterState, enforce_rate_limit};

pub fn router(config: &AppConfig) -> Router {
    let limiter = RateLimiterState::new(config.rate_limit_burst, config.rate_limit_window);

    let protected = Router::new()
        .route("/password/checklist", post(evaluate_checklist))
        .route("/password/validate", post(validate_password))
        .route_layer(middleware::from_fn(require_csrf_token))
        .route_layer(middleware::from_fn_with_state(limiter, enforce_rate_limit));

    Router::new().route("/csrf", get(issue_csrf_token)).merge(protected)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChecklistRequest {
    password: String,
    #[serde(default)]
    confirmation: Option<String>,
    #[serde(default)]
    identity: Option<IdentityFields>,
}

#[derive(Debug, Serialize)]
pub struct ChecklistResponse {
    checklist: Checklist,
    #[serde(skip_serializing_if = "Option::is_none")]
    confirmation: Option<RuleState>,
    strength: Strength,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidateRequest {
    password: String,
    #[serde(default)]
    confirmation: Option<String>,
    #[serde(default)]
    identity: Option<IdentityFields>,
}

#[derive(Debug, Serialize)]
struct CsrfResponse {
    csrf_token: String,
}

#[tracing::instrument(name = "issue_csrf_token")]
pub async fn issue_csrf_token() -> impl IntoResponse {
    let token = CsrfToken::generate();

    crate::log_security_event!(SecurityEvent::CsrfTokenIssued, "CSRF token issued");

    (
        [(SET_COOKIE, token.cookie())],
        Json(CsrfResponse {
            csrf_token: token.as_str().to_string(),
        }),
    )
}

#[tracing::instrument(name = "evaluate_checklist", skip(payload))]
pub async fn evaluate_checklist(
    ValidatedJson(payload): ValidatedJson<ChecklistRequest>,
) -> Json<ChecklistResponse> {
    let identity = payload.identity.as_ref();

    let response = ChecklistResponse {
        checklist: policy::checklist(&payload.password, identity),
        confirmation: payload
            .confirmation
            .as_deref()
            .map(|confirmation| policy::confirmation_state(&payload.password, confirmation)),
        strength: policy::strength(&payload.password),
    };

    tracing::debug!(
        is_valid = response.checklist.is_valid,
        score = response.strength.score,
        "Evaluated password checklist"
    );

    Json(response)
}

#[tracing::instrument(name = "validate_password", skip(payload))]
pub async fn validate_password(
    ValidatedJson(payload): ValidatedJson<ValidateRequest>,
) -> Result<StatusCode, AppError> {
    let identity = payload.identity.unwrap_or_default();
    let username = SanitizedUsername::new(identity.username.as_deref().unwrap_or_default());
    let email = SanitizedEmail::new(identity.email.as_deref().unwrap_or_default());

    if let Some(confirmation) = payload.confirmation.as_deref()
        && !policy::confirmation_state(&payload.password, confirmation).is_met()
    {
        return Err(AppError::Validation(
            "the two password fields didn't match".to_string(),
        ));
    }

    if let Err(violation) = policy::enforce(&payload.password, Some(&identity)) {
        crate::log_security_event!(
            SecurityEvent::PasswordRejected,
            username = %username,
            email = %email,
            reason = violation.code(),
            "Password rejected by policy"
        );
        return Err(violation.into());
    }

    crate::log_security_event!(
        SecurityEvent::PasswordAccepted,
        username = %username,
        email = %email,
        "Password accepted"
    );

    Ok(StatusCode::NO_CONTENT)
}
