use std::time::Duration;

use activity_digest::ai::{AiClient, AiConfig, CompletionRequest, TextGenerator};
use activity_digest::DigestError;
use mockito::Matcher;
use serde_json::json;

fn client(server: &mockito::Server) -> AiClient {
    AiClient::new(AiConfig {
        model: "openai/gpt-4.1".to_string(),
        api_key: "test-key".to_string(),
        endpoint: format!("{}/chat/completions", server.url()),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

fn request() -> CompletionRequest {
    CompletionRequest {
        system: "You summarize things.".to_string(),
        user: r#"{"title":"Fix","body":""}"#.to_string(),
        max_tokens: 4000,
    }
}

#[tokio::test]
async fn sends_system_and_user_messages() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::Json(json!({
            "model": "openai/gpt-4.1",
            "max_tokens": 4000,
            "messages": [
                { "role": "system", "content": "You summarize things." },
                { "role": "user", "content": r#"{"title":"Fix","body":""}"# }
            ]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"Fixes a bug."}}]}"#)
        .create_async()
        .await;

    let text = client(&server).complete(&request()).await.unwrap();

    assert_eq!(text, "Fixes a bug.");
    mock.assert_async().await;
}

#[tokio::test]
async fn non_success_status_carries_response_body() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_body("Too many requests")
        .create_async()
        .await;

    let err = client(&server).complete(&request()).await.unwrap_err();

    assert!(matches!(err, DigestError::Summarization(_)));
    let message = err.to_string();
    assert!(message.contains("429"), "{message}");
    assert!(message.contains("Too many requests"), "{message}");
}

#[tokio::test]
async fn malformed_body_is_a_summarization_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"unexpected":true}"#)
        .create_async()
        .await;

    let err = client(&server).complete(&request()).await.unwrap_err();
    assert!(matches!(err, DigestError::Summarization(_)));
}

#[tokio::test]
async fn empty_choices_is_a_summarization_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[]}"#)
        .create_async()
        .await;

    let err = client(&server).complete(&request()).await.unwrap_err();
    assert_eq!(err.to_string(), "text generation response contained no message");
}
