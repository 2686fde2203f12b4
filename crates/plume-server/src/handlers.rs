//! Route handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use plume_core::{Finding, GateDecision, RelayReply};
use plume_llm::{LimitsDocument, RelayError, RelayRequest};
use plume_spellcheck::CheckError;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::health::{health_check, HealthResponse};
use crate::server::AppState;

/// `{ "error": "..." }` with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

impl From<RelayError> for ApiError {
    fn from(e: RelayError) -> Self {
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, e.user_message())
    }
}

impl From<CheckError> for ApiError {
    fn from(e: CheckError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, e.body_text())
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(health_check())
}

pub async fn limits(State(state): State<AppState>) -> Json<LimitsDocument> {
    Json(state.relay.limits())
}

pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<RelayRequest>, JsonRejection>,
) -> Result<Json<RelayReply>, ApiError> {
    let Json(request) = body?;
    let reply = state.relay.relay(&request).await.map_err(|e| {
        if matches!(e, RelayError::EmptyMessage) {
            warn!("chat request without message");
        }
        ApiError::from(e)
    })?;
    Ok(Json(reply))
}

#[derive(Debug, Deserialize)]
pub struct SpellcheckRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellcheckResponse {
    pub findings: Vec<Finding>,
    pub checked_at: DateTime<Utc>,
    pub decision: GateDecision,
}

pub async fn spellcheck(
    State(state): State<AppState>,
    body: Result<Json<SpellcheckRequest>, JsonRejection>,
) -> Result<Json<SpellcheckResponse>, ApiError> {
    let Json(request) = body?;
    let result = state.gate.evaluate(&request.text).await?;
    let decision = result.decision();
    Ok(Json(SpellcheckResponse {
        findings: result.findings,
        checked_at: result.checked_at,
        decision,
    }))
}

#[cfg(test)]
mod tests {
    use plume_core::GatewayError;

    use super::*;

    #[test]
    fn relay_errors_keep_their_status() {
        let err = ApiError::from(RelayError::Gateway(GatewayError::RateLimited));
        assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.message, "Limite de requêtes atteinte. Réessayez plus tard.");

        let err = ApiError::from(RelayError::EmptyMessage);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Message is required");
    }

    #[test]
    fn empty_text_is_bad_request() {
        let err = ApiError::from(CheckError::EmptyText);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
