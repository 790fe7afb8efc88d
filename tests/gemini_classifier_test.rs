use serde_json::{json, Value};
use snapguard::{
    ClassificationResult, ClassifierConfig, ClassifyError, GlobalLogger, ImageSource,
    NetworkImage, SensitiveContentClassifier,
};
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const GENERATE_PATH: &str = "/models/gemini-test:generateContent";

fn gemini_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

fn classifier_for(server: &MockServer) -> SensitiveContentClassifier {
    let config = ClassifierConfig::new("test-api-key")
        .with_base_url(server.uri())
        .with_model("gemini-test");
    SensitiveContentClassifier::new(config, Arc::new(GlobalLogger)).unwrap()
}

async fn mount_reply(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-api-key"))
        .respond_with(template)
        .expect(1)
        .mount(server)
        .await;
}

async fn sent_body(server: &MockServer) -> Value {
    let requests: Vec<Request> = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    serde_json::from_slice(&requests[0].body).unwrap()
}

#[tokio::test]
async fn text_only_request_matches_gemini_wire_shape() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        ResponseTemplate::new(200).set_body_json(gemini_reply(
            r#"{"imageClassification":"none","textClassification":"notSensitive","isSensitive":false}"#,
        )),
    )
    .await;

    let result = classifier_for(&server)
        .classify(None, "This image might contain sensitive content.")
        .await;
    assert_eq!(
        result,
        Some(ClassificationResult::new("none", "notSensitive", false))
    );

    let body = sent_body(&server).await;
    let parts = body["contents"][0]["parts"].as_array().unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[1]["text"], "This image might contain sensitive content.");
    assert_eq!(body["contents"][0]["role"], "user");

    let generation = &body["generationConfig"];
    assert_eq!(generation["responseMimeType"], "application/json");
    assert_eq!(generation["topK"], 64);
    assert_eq!(generation["maxOutputTokens"], 8192);
    assert!((generation["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    assert!((generation["topP"].as_f64().unwrap() - 0.95).abs() < 1e-6);
    assert_eq!(
        generation["responseSchema"]["required"],
        json!(["imageClassification", "textClassification", "isSensitive"])
    );

    let safety = body["safetySettings"].as_array().unwrap();
    assert_eq!(safety.len(), 4);
    assert!(safety.iter().all(|s| s["threshold"] == "BLOCK_NONE"));
}

#[tokio::test]
async fn image_bytes_are_sent_as_base64_jpeg_part() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        ResponseTemplate::new(200).set_body_json(gemini_reply(
            r#"{"imageClassification":"violence","textClassification":"none","isSensitive":true}"#,
        )),
    )
    .await;

    let result = classifier_for(&server)
        .try_classify_source(Some(ImageSource::Bytes(b"hello".to_vec())), "")
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_sensitive());
    assert_eq!(result.image_classification(), "violence");

    let body = sent_body(&server).await;
    let parts = body["contents"][0]["parts"].as_array().unwrap();
    assert_eq!(parts.len(), 3);
    assert_eq!(
        parts[2],
        json!({"inlineData": {"mimeType": "image/jpeg", "data": "aGVsbG8="}})
    );
}

#[tokio::test]
async fn response_without_candidates_is_no_result() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": { "blockReason": "OTHER" }
        })),
    )
    .await;

    let classifier = classifier_for(&server);
    assert!(matches!(classifier.try_classify(None, "anything").await, Ok(None)));
}

#[tokio::test]
async fn http_errors_are_transport_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let classifier = classifier_for(&server);
    match classifier.try_classify(None, "hi").await {
        Err(ClassifyError::Transport(e)) => {
            assert!(e.is_retryable());
            assert!(e.to_string().contains("quota exceeded"));
        }
        other => panic!("expected transport failure, got {other:?}"),
    }
    assert!(classifier.classify(None, "hi").await.is_none());
}

#[tokio::test]
async fn malformed_classification_json_is_reported() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        ResponseTemplate::new(200).set_body_json(gemini_reply(
            r#"{"imageClassification":"none","textClassification":"none","isSensitive":"no"}"#,
        )),
    )
    .await;

    let err = classifier_for(&server)
        .try_classify(None, "hi")
        .await
        .unwrap_err();
    assert!(matches!(err, ClassifyError::MalformedResponse(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn unreachable_image_url_is_an_acquisition_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let classifier = classifier_for(&server);
    let image = NetworkImage::new(format!("{}/missing.png", server.uri()));

    let err = classifier
        .try_classify_image_source(&image, "caption")
        .await
        .unwrap_err();
    assert!(matches!(err, ClassifyError::ImageAcquisition(_)));
    assert!(classifier.classify_image_source(&image, "caption").await.is_none());

    // the model endpoint was never called
    let posts = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "POST")
        .count();
    assert_eq!(posts, 0);
}
