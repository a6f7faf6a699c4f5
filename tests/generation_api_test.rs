mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

use common::{offline_app, send, CannedModel};
use quiz_backend::dto::generation_dto::MISSING_FIELDS_MESSAGE;
use quiz_backend::error::{GENERATION_FAILED_MESSAGE, MALFORMED_OUTPUT_MESSAGE};
use quiz_backend::services::ai_service::MISSING_API_KEY_MESSAGE;

const ROME_TRUE_FALSE: &str = r#"```json
[
  {"text": "Rome was founded in 753 BC.", "type": "true_false",
   "answers": [{"text": "True", "isCorrect": true}, {"text": "False", "isCorrect": false}]},
  {"text": "Julius Caesar was the first Roman emperor.", "type": "true_false",
   "answers": [{"text": "True", "isCorrect": false}, {"text": "False", "isCorrect": true}]}
]
```"#;

fn rome_request() -> serde_json::Value {
    json!({
        "topic": "Rome",
        "difficulty": "easy",
        "questionCount": 2,
        "questionTypes": ["true_false"]
    })
}

#[tokio::test]
async fn generates_true_false_questions() {
    let app = offline_app(Some(CannedModel(Some(ROME_TRUE_FALSE.to_string()))));

    let (status, body) = send(&app, "POST", "/api/generate-questions", None, Some(rome_request())).await;

    assert_eq!(status, StatusCode::OK);
    let questions = body["questions"].as_array().expect("questions array");
    assert_eq!(questions.len(), 2);
    for q in questions {
        assert_eq!(q["type"], "true_false");
        let answers = q["answers"].as_array().expect("answers");
        let texts: Vec<&str> = answers.iter().filter_map(|a| a["text"].as_str()).collect();
        assert_eq!(texts, vec!["True", "False"]);
        let correct = answers.iter().filter(|a| a["isCorrect"] == true).count();
        assert_eq!(correct, 1);
    }
}

#[tokio::test]
async fn extra_questions_are_truncated() {
    let app = offline_app(Some(CannedModel(Some(ROME_TRUE_FALSE.to_string()))));
    let mut request = rome_request();
    request["questionCount"] = json!(1);

    let (status, body) = send(&app, "POST", "/api/generate-questions", None, Some(request)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["questions"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn missing_topic_is_a_bad_request() {
    let app = offline_app(Some(CannedModel(Some(ROME_TRUE_FALSE.to_string()))));

    let (status, body) = send(
        &app,
        "POST",
        "/api/generate-questions",
        None,
        Some(json!({"questionCount": 2, "questionTypes": ["true_false"]})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], MISSING_FIELDS_MESSAGE);
}

#[tokio::test]
async fn empty_types_are_rejected_before_credentials_are_checked() {
    let app = offline_app(None);

    let (status, body) = send(
        &app,
        "POST",
        "/api/generate-questions",
        None,
        Some(json!({"topic": "Rome", "questionCount": 2, "questionTypes": []})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], MISSING_FIELDS_MESSAGE);
}

#[tokio::test]
async fn unknown_question_type_is_a_bad_request() {
    let app = offline_app(None);
    let mut request = rome_request();
    request["questionTypes"] = json!(["essay"]);

    let (status, _) = send(&app, "POST", "/api/generate-questions", None, Some(request)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_api_key_is_a_server_error() {
    let app = offline_app(None);

    let (status, body) = send(&app, "POST", "/api/generate-questions", None, Some(rome_request())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], MISSING_API_KEY_MESSAGE);
}

#[tokio::test]
async fn upstream_failure_hides_details() {
    let app = offline_app(Some(CannedModel(None)));

    let (status, body) = send(&app, "POST", "/api/generate-questions", None, Some(rome_request())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], GENERATION_FAILED_MESSAGE);
}

#[tokio::test]
async fn prose_reply_is_malformed_output() {
    let app = offline_app(Some(CannedModel(Some(
        "Sure! Here are some questions about Rome.".to_string(),
    ))));

    let (status, body) = send(&app, "POST", "/api/generate-questions", None, Some(rome_request())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], MALFORMED_OUTPUT_MESSAGE);
}

#[tokio::test]
async fn health_reports_generation_status() {
    let app = offline_app(None);

    let (status, body) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["generationConfigured"], false);
}

#[tokio::test]
async fn body_without_json_content_type_gets_json_error() {
    let app = offline_app(None);
    let request = Request::builder()
        .method("POST")
        .uri("/api/generate-questions")
        .body(Body::from(rome_request().to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].as_str().is_some_and(|m| !m.is_empty()));
}

#[tokio::test]
async fn empty_model_reply_list_is_malformed_output() {
    let app = offline_app(Some(CannedModel(Some("[]".to_string()))));

    let (status, body) = send(&app, "POST", "/api/generate-questions", None, Some(rome_request())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], MALFORMED_OUTPUT_MESSAGE);
}
