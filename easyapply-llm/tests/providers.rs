mod common;

use easyapply_common::{EasyApplyError, Result};
use easyapply_llm::gemini::GeminiClient;
use easyapply_llm::ollama::OllamaClient;
use easyapply_llm::traits::LlmClient;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GEMINI_MODEL: &str = "gemini-1.5-flash";

fn gemini_reply(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "totalTokenCount": 42 }
    })
}

#[tokio::test]
async fn gemini_answers_a_question() -> Result<()> {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/models/{GEMINI_MODEL}:generateContent")))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "generationConfig": { "maxOutputTokens": 200 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(
            "\"I have shipped Rust services for five years.\"",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new("test-key".into(), GEMINI_MODEL.into())?
        .with_base_url(server.uri());

    let answer = client
        .answer_question("Describe your experience", "Name: Ada", Some(200), Some(0.7))
        .await?;
    assert_eq!(answer, "I have shipped Rust services for five years.");
    Ok(())
}

#[tokio::test]
async fn gemini_rate_limit_surfaces_as_agent_error() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = GeminiClient::new("test-key".into(), GEMINI_MODEL.into())?
        .with_base_url(server.uri());

    let err = client.generate("hi", None, None, None).await.unwrap_err();
    match err {
        EasyApplyError::Agent(msg) => assert!(msg.contains("Rate limit")),
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn gemini_safety_block_is_an_error() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        })))
        .mount(&server)
        .await;

    let client = GeminiClient::new("test-key".into(), GEMINI_MODEL.into())?
        .with_base_url(server.uri());

    assert!(client.generate("hi", None, None, None).await.is_err());
    Ok(())
}

#[test]
fn gemini_rejects_blank_key() {
    let err = GeminiClient::new("  ".into(), GEMINI_MODEL.into()).err();
    assert!(matches!(err, Some(EasyApplyError::Config(_))));
}

#[tokio::test]
async fn ollama_generates_against_local_server() -> Result<()> {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{ "name": "llama3.2:3b" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({ "model": "llama3.2:3b", "stream": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Immediately.",
            "eval_count": 3
        })))
        .mount(&server)
        .await;

    let client = OllamaClient::new(server.uri(), "llama3.2:3b".into()).await?;
    assert!(client.health_check().await?);

    let response = client.generate("When can you start?", None, Some(20), None).await?;
    assert_eq!(response.text, "Immediately.");
    assert_eq!(response.tokens_used, Some(3));
    Ok(())
}

#[tokio::test]
async fn ollama_pulls_missing_model() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/pull"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OllamaClient::new(server.uri(), "qwen2.5:7b".into()).await?;
    assert_eq!(client.model_name(), "qwen2.5:7b");
    Ok(())
}
