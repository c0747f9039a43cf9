use axum::{extract::State, routing::post, Json, Router};
use serde_json::Value;

use crate::dispatch::{dispatch, ActionRequest, AppState};
use crate::error::RequestError;
use crate::models::Envelope;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/webhook", post(handle_command))
        .with_state(state)
}

/// Single inbound endpoint accepting `{action, params}`. Request-shape
/// problems are the only 400s; every handler failure comes back as 200 with an
/// error envelope, so callers must inspect the envelope's `status` field.
async fn handle_command(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<Envelope>, RequestError> {
    let request = decode_request(payload)?;
    Ok(Json(dispatch(&state, request).await))
}

fn decode_request(payload: Value) -> Result<ActionRequest, RequestError> {
    let Some(action) = payload.get("action") else {
        return Err(RequestError::MissingAction);
    };
    let Some(action) = action.as_str().map(str::to_string) else {
        return Err(RequestError::Malformed("'action' must be a string".to_string()));
    };
    if !ActionRequest::is_known(&action) {
        return Err(RequestError::UnknownAction(action));
    }

    serde_json::from_value(payload).map_err(|e| RequestError::InvalidParams {
        action,
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_action_is_rejected() {
        let err = decode_request(json!({ "params": {} })).unwrap_err();
        assert!(matches!(err, RequestError::MissingAction));
        assert_eq!(err.to_string(), "Missing 'action' in payload.");
    }

    #[test]
    fn unknown_action_is_named_in_the_error() {
        let err = decode_request(json!({ "action": "frobnicate" })).unwrap_err();
        assert_eq!(err.to_string(), "Unknown action: frobnicate");
    }

    #[test]
    fn non_string_action_is_malformed() {
        let err = decode_request(json!({ "action": 7 })).unwrap_err();
        assert!(matches!(err, RequestError::Malformed(_)));
    }

    #[test]
    fn bad_params_for_known_action_name_the_action() {
        let err = decode_request(json!({ "action": "push", "params": {} })).unwrap_err();
        let RequestError::InvalidParams { action, detail } = err else {
            panic!("wrong error kind");
        };
        assert_eq!(action, "push");
        assert!(detail.contains("local_path"));
    }

    #[test]
    fn well_formed_request_decodes() {
        let request = decode_request(json!({
            "action": "summarize_repo",
            "params": { "repo_name": "octo/demo" },
        }))
        .unwrap();
        assert!(matches!(request, ActionRequest::SummarizeRepo { .. }));
    }
}
