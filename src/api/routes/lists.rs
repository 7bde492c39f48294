use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::classify::{classify_text, Classification};
use crate::ingest::{ingest_text, IngestError, IngestOptions, IngestResult};
use crate::models::FormatId;

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub text: String,
    /// Dialect to force, e.g. `"wtc-compact"`
    pub format: Option<String>,
}

fn require_text(text: &str) -> Result<(), ApiError> {
    if text.trim().is_empty() {
        return Err(ApiError::BadRequest("text must not be empty".to_string()));
    }
    Ok(())
}

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::EmptyInput => ApiError::BadRequest(e.to_string()),
            IngestError::UndetectedFormat { .. } => ApiError::Unprocessable(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

pub async fn classify(
    payload: Result<Json<ClassifyRequest>, JsonRejection>,
) -> Result<Json<Classification>, ApiError> {
    let Json(request) = payload?;
    require_text(&request.text)?;

    let classification = tokio::task::spawn_blocking(move || classify_text(&request.text))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    debug!(
        "Classified request as {} ({:.2})",
        classification.format, classification.confidence
    );
    Ok(Json(classification))
}

pub async fn parse(
    State(state): State<AppState>,
    payload: Result<Json<ParseRequest>, JsonRejection>,
) -> Result<Json<IngestResult>, ApiError> {
    let Json(request) = payload?;
    require_text(&request.text)?;

    let format_override = request
        .format
        .as_deref()
        .map(str::parse::<FormatId>)
        .transpose()
        .map_err(ApiError::BadRequest)?;
    let options = IngestOptions {
        format_override,
        ..(*state.options).clone()
    };

    let abbreviations = state.abbreviations.clone();
    let result =
        tokio::task::spawn_blocking(move || ingest_text(&request.text, &options, &abbreviations))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use crate::api::build_router;
    use crate::api::state::AppState;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    const WTC: &str = include_str!("../../../tests/fixtures/wtc.txt");
    const NRNR: &str = include_str!("../../../tests/fixtures/nrnr.txt");

    async fn post_json(uri: &str, body: String) -> (StatusCode, Value) {
        let app = build_router(AppState::default());
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_classify_endpoint() {
        let (status, json) = post_json("/api/classify", json!({ "text": WTC }).to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["format"], "wtc");
        assert!(json["scores"]["wtc"].as_i64().unwrap() > 0);
        assert!(json["breakdown"].is_object());
    }

    #[tokio::test]
    async fn test_parse_endpoint() {
        let (status, json) = post_json("/api/parse", json!({ "text": NRNR }).to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["format"], "nrnr");
        assert_eq!(json["list"]["summary"]["factionKey"], "tyranids");
        assert!(json["abbreviations"]["flatAbbreviations"].is_object());
        assert_eq!(json["id"].as_str().unwrap().len(), 16);
    }

    #[tokio::test]
    async fn test_parse_with_format_override() {
        let body = json!({ "text": WTC, "format": "wtc-compact" }).to_string();
        let (status, json) = post_json("/api/parse", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["format"], "wtc-compact");
        assert_eq!(json["classification"]["format"], "wtc");
    }

    #[tokio::test]
    async fn test_parse_errors() {
        let (status, json) =
            post_json("/api/parse", json!({ "text": WTC, "format": "battlescribe" }).to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");

        let (status, json) = post_json("/api/parse", json!({ "text": "   " }).to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"]["message"].is_string());

        let (status, json) =
            post_json("/api/parse", json!({ "text": "shopping list\nmilk\n" }).to_string()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"]["code"], "UNDETECTED_FORMAT");

        let (status, _) = post_json("/api/classify", "{not json".to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
