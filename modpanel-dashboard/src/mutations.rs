use metrics::counter;
use serde::Serialize;
use serde_json::{json, Value};
use validator::Validate;

use modpanel_shared::clients::ModerationApi;
use modpanel_shared::errors::{AppError, AppResult};

use crate::actions::HttpVerb;
use crate::queries::STRIKES_PATH;

// --- Request types ---

#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreateStrikeRequest {
    #[validate(length(min = 1, message = "user id must not be empty"))]
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CreateStrikeRequest {
    /// A blank reason is left out of the request body.
    pub fn new(user_id: impl Into<String>, reason: &str) -> Self {
        let reason = reason.trim();
        Self {
            user_id: user_id.into(),
            reason: (!reason.is_empty()).then(|| reason.to_string()),
        }
    }
}

/// A raw REST call. The method is kept as text and checked at dispatch.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub method: String,
    pub path: String,
    pub body: Option<Value>,
}

fn outcome<T>(result: &AppResult<T>) -> &'static str {
    if result.is_ok() { "ok" } else { "error" }
}

// --- Issue strike ---

pub async fn create_strike<A: ModerationApi + ?Sized>(
    api: &A,
    request: &CreateStrikeRequest,
) -> AppResult<Value> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let body = serde_json::to_value(request)
        .map_err(|e| AppError::internal(format!("failed to encode strike: {e}")))?;

    let result = api.post(STRIKES_PATH, &body).await;
    counter!("modpanel_mutations_total", "kind" => "strike", "outcome" => outcome(&result)).increment(1);

    match &result {
        Ok(_) => tracing::info!(user_id = %request.user_id, "strike issued"),
        Err(e) => tracing::warn!(user_id = %request.user_id, error = %e, "strike rejected"),
    }

    result
}

// --- Generic action ---

/// Dispatches DELETE, PUT or POST (any casing). Other methods fail before a
/// request is made. Bodies default to `{}` for PUT and POST.
pub async fn run_action<A: ModerationApi + ?Sized>(api: &A, request: &ActionRequest) -> AppResult<Value> {
    let verb: HttpVerb = request.method.parse()?;
    let body = request.body.clone().unwrap_or_else(|| json!({}));

    let result = match verb {
        HttpVerb::Delete => api.delete(&request.path).await,
        HttpVerb::Put => api.put(&request.path, &body).await,
        HttpVerb::Post => api.post(&request.path, &body).await,
    };

    counter!("modpanel_mutations_total", "kind" => verb.as_str(), "outcome" => outcome(&result)).increment(1);

    match &result {
        Ok(_) => tracing::info!(method = %verb, path = %request.path, "action applied"),
        Err(e) => tracing::warn!(method = %verb, path = %request.path, error = %e, "action rejected"),
    }

    result
}
