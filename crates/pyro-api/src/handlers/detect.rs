//! Detection endpoints.

use axum::extract::{Multipart, State};
use axum::Json;
use serde_json::{json, Map, Value};
use tracing::info;

use pyro_models::{AlertDecision, DetectionResult};

use crate::error::{ApiError, ApiResult};
use crate::metrics::record_decision;
use crate::state::AppState;

/// Pull the uploaded image out of the multipart form.
///
/// The field must be named `image`. A missing field, an unreadable part and
/// an empty payload are all the caller's fault and map to 400.
async fn read_image_field(mut multipart: Multipart) -> ApiResult<Vec<u8>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some("image") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read image field: {e}")))?;
            if bytes.is_empty() {
                return Err(ApiError::bad_request("No image uploaded"));
            }
            return Ok(bytes.to_vec());
        }
    }

    Err(ApiError::bad_request("No image uploaded"))
}

/// Flatten one detector's result into the wire object.
///
/// Emits `<hazard>_detected` and `<hazard>_confidence` (percent, two
/// decimals) and, for degraded results, `<hazard>_error`.
fn push_hazard(out: &mut Map<String, Value>, name: &str, result: &DetectionResult) {
    out.insert(format!("{name}_detected"), json!(result.present));
    out.insert(
        format!("{name}_confidence"),
        json!(result.confidence_percent()),
    );
    if let Some(error) = &result.error {
        out.insert(format!("{name}_error"), json!(error));
    }
}

fn render_decision(decision: &AlertDecision) -> Map<String, Value> {
    let mut out = Map::new();
    for (name, result) in &decision.per_hazard {
        push_hazard(&mut out, name, result);
    }
    out.insert("alert".to_string(), json!(decision.alert));
    out
}

/// POST /detect - run every registered detector and fuse into one verdict.
pub async fn detect(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let raw = read_image_field(multipart).await?;
    let decision = state.orchestrator.assess(&raw).await?;

    record_decision(decision.alert, decision.any_degraded());
    info!(
        alert = decision.alert,
        degraded = decision.any_degraded(),
        bytes = raw.len(),
        "Detection request completed"
    );

    Ok(Json(Value::Object(render_decision(&decision))))
}

/// Run a single named detector and render it in the same wire shape.
async fn single_hazard(state: &AppState, hazard: &str, multipart: Multipart) -> ApiResult<Json<Value>> {
    let raw = read_image_field(multipart).await?;
    let result = state.orchestrator.assess_single(hazard, &raw).await?;

    let mut out = Map::new();
    push_hazard(&mut out, hazard, &result);
    Ok(Json(Value::Object(out)))
}

/// POST /fire-model - fire detector only.
pub async fn fire_model(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<Value>> {
    single_hazard(&state, "fire", multipart).await
}

/// POST /human-model - human detector only.
pub async fn human_model(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<Value>> {
    single_hazard(&state, "human", multipart).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_render_decision_shape() {
        let mut per_hazard = BTreeMap::new();
        per_hazard.insert(
            "fire".to_string(),
            DetectionResult::classifier("fire", 0.982, 0.9),
        );
        per_hazard.insert(
            "human".to_string(),
            DetectionResult::classifier("human", 0.0568, 0.5),
        );
        let decision = AlertDecision::new(false, per_hazard);

        let out = render_decision(&decision);
        assert_eq!(out["fire_detected"], json!(true));
        assert_eq!(out["fire_confidence"], json!(98.2));
        assert_eq!(out["human_detected"], json!(false));
        assert_eq!(out["human_confidence"], json!(5.68));
        assert_eq!(out["alert"], json!(false));
        assert!(!out.contains_key("fire_error"));
    }

    #[test]
    fn test_render_decision_includes_error_field_when_degraded() {
        let mut per_hazard = BTreeMap::new();
        per_hazard.insert(
            "fire".to_string(),
            DetectionResult::failed("fire", "backend offline"),
        );
        let decision = AlertDecision::new(false, per_hazard);

        let out = render_decision(&decision);
        assert_eq!(out["fire_detected"], json!(false));
        assert_eq!(out["fire_confidence"], json!(0.0));
        assert_eq!(out["fire_error"], json!("backend offline"));
    }
}
