//! Integration tests for the inference backend against a `wiremock` server.

use std::sync::Arc;

use newsdigest_core::SentimentLabel;
use newsdigest_nlp::{
    InferenceClassifier, InferenceClient, InferenceSummarizer, NlpError, SentimentClassifier,
    Summarizer,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ARTICLE: &str = "한국은행이 기준금리를 연 3.5%로 동결했다. \
    물가 상승세가 둔화되고 있지만 가계부채 증가세가 이어지고 있다는 판단이다.";

fn client(server: &MockServer, api_key: Option<&str>) -> Arc<InferenceClient> {
    Arc::new(
        InferenceClient::new(&server.uri(), api_key.map(str::to_string))
            .expect("failed to build test InferenceClient"),
    )
}

// ---------------------------------------------------------------------------
// Summarizer
// ---------------------------------------------------------------------------

#[tokio::test]
async fn summarizer_sends_length_parameters_and_reads_summary_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/digit82/kobart-summarization"))
        .and(header("authorization", "Bearer hf_test"))
        .and(body_partial_json(json!({
            "parameters": { "min_length": 30, "max_length": 100 }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "summary_text": "  기준금리 3.5% 동결  " }])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let summarizer = InferenceSummarizer::new(
        client(&server, Some("hf_test")),
        "digit82/kobart-summarization",
        30,
        100,
    );
    let summary = summarizer.summarize(ARTICLE).await.expect("summary");
    assert_eq!(summary, "기준금리 3.5% 동결");
}

#[tokio::test]
async fn summarizer_rejects_short_input_without_calling_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let summarizer = InferenceSummarizer::new(client(&server, None), "m", 30, 100);
    let err = summarizer.summarize("짧다").await.unwrap_err();
    assert!(matches!(err, NlpError::InputTooShort { .. }), "got: {err:?}");
}

#[tokio::test]
async fn summarizer_maps_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/m"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let summarizer = InferenceSummarizer::new(client(&server, None), "m", 30, 100);
    let err = summarizer.summarize(ARTICLE).await.unwrap_err();
    assert!(
        matches!(err, NlpError::UnexpectedStatus { status: 503, .. }),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn summarizer_rejects_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/m"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let summarizer = InferenceSummarizer::new(client(&server, None), "m", 30, 100);
    let err = summarizer.summarize(ARTICLE).await.unwrap_err();
    assert!(matches!(err, NlpError::InvalidResponse { .. }), "got: {err:?}");
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

#[tokio::test]
async fn classifier_maps_index_labels_from_nested_output() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/snunlp/KR-FinBERT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[
            { "label": "LABEL_0", "score": 0.05 },
            { "label": "LABEL_1", "score": 0.15 },
            { "label": "LABEL_2", "score": 0.80 }
        ]])))
        .mount(&server)
        .await;

    let classifier = InferenceClassifier::new(client(&server, None), "snunlp/KR-FinBERT");
    let sentiment = classifier.classify("기준금리 동결").await.expect("sentiment");
    assert_eq!(sentiment.label, SentimentLabel::Positive);
    assert!((sentiment.score - 0.80).abs() < 1e-9);
}

#[tokio::test]
async fn classifier_rejects_unknown_labels() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/m"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "label": "LABEL_7", "score": 0.9 }])),
        )
        .mount(&server)
        .await;

    let classifier = InferenceClassifier::new(client(&server, None), "m");
    let err = classifier.classify("기준금리 동결").await.unwrap_err();
    assert!(
        matches!(err, NlpError::UnknownLabel(ref label) if label == "LABEL_7"),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn classifier_reports_malformed_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/m"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"error\":\"loading\"}"))
        .mount(&server)
        .await;

    let classifier = InferenceClassifier::new(client(&server, None), "m");
    let err = classifier.classify("기준금리 동결").await.unwrap_err();
    assert!(matches!(err, NlpError::InvalidResponse { .. }), "got: {err:?}");
}
