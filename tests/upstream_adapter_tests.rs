//! # Upstream Adapter Tests
//!
//! Exercises the real HTTP adapters against `wiremock` servers standing in
//! for the chat and prediction providers.

use std::time::Duration;

use ai_relay::{
    adapters::{ChatUpstream, OpenAICompatibleAdapter, PredictionUpstream, ReplicateAdapter},
    config::Config,
    core::http_client::HttpClientBuilder,
    error::ErrorKind,
    polling::{run_async_image_job, PollPolicy},
    providers::{Provider, ProviderRegistry},
    schemas::{ChatRequest, ChatStreamEvent, ImageJobRequest, Message, PredictionStatus, Role, ValidateKeyRequest},
    streaming::relay_events,
};
use futures_util::StreamExt;
use serde_json::json;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

const FLUX: &str = "black-forest-labs/flux-schnell";

fn client() -> reqwest::Client {
    HttpClientBuilder::new().build().unwrap()
}

fn chat_adapter(server: &MockServer) -> OpenAICompatibleAdapter {
    OpenAICompatibleAdapter::new(client(), ProviderRegistry::single(&server.uri()))
}

fn image_adapter(server: &MockServer) -> ReplicateAdapter {
    ReplicateAdapter::new(client(), server.uri(), FLUX)
}

fn chat_request(provider: Provider) -> ChatRequest {
    ChatRequest {
        messages: vec![Message {
            role: Role::User,
            content: "Say hello".to_string(),
        }],
        api_key: "sk-test".to_string(),
        model: None,
        provider,
        temperature: None,
        max_tokens: None,
    }
}

fn image_request() -> ImageJobRequest {
    ImageJobRequest {
        prompt: "a lighthouse at dusk".to_string(),
        api_key: "r8_test".to_string(),
        model: None,
    }
}

fn sse(chunks: &[&str]) -> String {
    chunks.iter().map(|chunk| format!("data: {}\n\n", chunk)).collect()
}

// =============================================================================
// CHAT COMPLETIONS
// =============================================================================

#[tokio::test]
async fn test_chat_request_shape_and_fragments() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_json(json!({
            "model": "gpt-4o-mini",
            "messages": [{"role": "user", "content": "Say hello"}],
            "stream": true,
            "temperature": 0.7,
            "max_tokens": 2048
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            sse(&[
                r#"{"choices":[{"delta":{"role":"assistant"}}]}"#,
                r#"{"choices":[{"delta":{"content":"Hel"}}]}"#,
                r#"{"choices":[{"delta":{"content":""}}]}"#,
                r#"{"choices":[{"delta":{"content":"lo"}}]}"#,
                "[DONE]",
            ]),
            "text/event-stream",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let stream = chat_adapter(&server)
        .stream_chat_completion(&chat_request(Provider::OpenAI))
        .await
        .unwrap();
    let events: Vec<_> = relay_events(stream).collect().await;

    assert_eq!(
        events,
        vec![
            ChatStreamEvent::content("Hel"),
            ChatStreamEvent::content("lo"),
            ChatStreamEvent::Done,
        ]
    );
}

#[tokio::test]
async fn test_chat_deepseek_uses_its_default_model() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_json(json!({
            "model": "deepseek-chat",
            "messages": [{"role": "user", "content": "Say hello"}],
            "stream": true,
            "temperature": 0.1,
            "max_tokens": 100
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse(&["[DONE]"]), "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let mut request = chat_request(Provider::DeepSeek);
    request.temperature = Some(0.1);
    request.max_tokens = Some(100);

    let stream = chat_adapter(&server).stream_chat_completion(&request).await.unwrap();
    let events: Vec<_> = relay_events(stream).collect().await;
    assert_eq!(events, vec![ChatStreamEvent::Done]);
}

#[tokio::test]
async fn test_chat_deepseek_routes_to_its_base_url() {
    let openai = MockServer::start().await;
    let deepseek = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse(&["[DONE]"]), "text/event-stream"))
        .expect(1)
        .mount(&deepseek)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&openai)
        .await;

    let mut config = Config::for_test();
    config.openai_base_url = openai.uri();
    config.deepseek_base_url = deepseek.uri();
    let adapter = OpenAICompatibleAdapter::new(client(), ProviderRegistry::from_config(&config));

    assert!(adapter
        .stream_chat_completion(&chat_request(Provider::DeepSeek))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_chat_unauthorized_maps_to_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let err = chat_adapter(&server)
        .stream_chat_completion(&chat_request(Provider::OpenAI))
        .await
        .err()
        .unwrap();

    assert_eq!(err.kind, ErrorKind::Auth);
    assert_eq!(err.status, 401);
    assert_eq!(err.message, "Invalid API key. Check your API key in Settings.");
}

#[tokio::test]
async fn test_chat_upstream_status_and_message_mirrored() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "Rate limit reached for gpt-4o-mini"}
        })))
        .mount(&server)
        .await;

    let err = chat_adapter(&server)
        .stream_chat_completion(&chat_request(Provider::OpenAI))
        .await
        .err()
        .unwrap();

    assert_eq!(err.status, 429);
    assert_eq!(err.message, "Rate limit reached for gpt-4o-mini");
}

#[tokio::test]
async fn test_chat_upstream_error_without_body_uses_default() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = chat_adapter(&server)
        .stream_chat_completion(&chat_request(Provider::OpenAI))
        .await
        .err()
        .unwrap();

    assert_eq!(err.status, 502);
    assert_eq!(err.message, "Failed to get response from OpenAI");
}

#[tokio::test]
async fn test_chat_malformed_chunk_interrupts_stream() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            sse(&[
                r#"{"choices":[{"delta":{"content":"Hel"}}]}"#,
                r#"{"choices":[{"delta":"#,
                r#"{"choices":[{"delta":{"content":"lo"}}]}"#,
                "[DONE]",
            ]),
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let stream = chat_adapter(&server)
        .stream_chat_completion(&chat_request(Provider::OpenAI))
        .await
        .unwrap();
    let events: Vec<_> = relay_events(stream).collect().await;

    assert_eq!(
        events,
        vec![
            ChatStreamEvent::content("Hel"),
            ChatStreamEvent::Error {
                message: "Stream interrupted".to_string()
            },
        ]
    );
}

#[tokio::test]
async fn test_chat_unreachable_upstream() {
    let adapter = OpenAICompatibleAdapter::new(client(), ProviderRegistry::single("http://127.0.0.1:9"));

    let err = adapter
        .stream_chat_completion(&chat_request(Provider::OpenAI))
        .await
        .err()
        .unwrap();

    assert_eq!(err.status, 500);
}

// =============================================================================
// KEY VALIDATION
// =============================================================================

#[tokio::test]
async fn test_validate_key_accepted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .and(header("authorization", "Bearer sk-good"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let request = ValidateKeyRequest {
        api_key: "sk-good".to_string(),
        provider: Provider::OpenAI,
    };
    assert!(chat_adapter(&server).validate_key(&request).await.is_ok());
}

#[tokio::test]
async fn test_validate_key_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided"}
        })))
        .mount(&server)
        .await;

    let request = ValidateKeyRequest {
        api_key: "sk-bad".to_string(),
        provider: Provider::DeepSeek,
    };
    let err = chat_adapter(&server).validate_key(&request).await.unwrap_err();
    assert_eq!(err.status, 401);
    assert_eq!(err.message, "Incorrect API key provided");
}

#[tokio::test]
async fn test_validate_key_rejected_without_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let request = ValidateKeyRequest {
        api_key: "sk-bad".to_string(),
        provider: Provider::OpenAI,
    };
    let err = chat_adapter(&server).validate_key(&request).await.unwrap_err();
    assert_eq!(err.message, "Invalid API key");
}

// =============================================================================
// PREDICTIONS
// =============================================================================

fn prediction(server: &MockServer, status: &str, output: serde_json::Value) -> serde_json::Value {
    json!({
        "id": "p1",
        "status": status,
        "urls": {"get": format!("{}/predictions/p1", server.uri())},
        "output": output,
        "error": null
    })
}

#[tokio::test]
async fn test_create_prediction_request_shape() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/models/{}/predictions", FLUX)))
        .and(header("authorization", "Token r8_test"))
        .and(body_json(json!({"input": {"prompt": "a lighthouse at dusk"}})))
        .respond_with(ResponseTemplate::new(201).set_body_json(prediction(&server, "starting", json!(null))))
        .expect(1)
        .mount(&server)
        .await;

    let job = image_adapter(&server).create_prediction(&image_request()).await.unwrap();

    assert_eq!(job.id.as_deref(), Some("p1"));
    assert_eq!(job.status, PredictionStatus::Starting);
    assert_eq!(job.poll_url, format!("{}/predictions/p1", server.uri()));
}

#[tokio::test]
async fn test_create_prediction_forbidden() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "Forbidden"})))
        .mount(&server)
        .await;

    let err = image_adapter(&server).create_prediction(&image_request()).await.unwrap_err();
    assert_eq!(err.status, 401);
    assert_eq!(err.message, "Image generation failed. Check your Replicate API key in Settings.");
}

#[tokio::test]
async fn test_create_prediction_detail_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "title": "Input validation failed",
            "detail": "prompt is too long"
        })))
        .mount(&server)
        .await;

    let err = image_adapter(&server).create_prediction(&image_request()).await.unwrap_err();
    assert_eq!(err.status, 422);
    assert_eq!(err.message, "prompt is too long");
}

#[tokio::test]
async fn test_create_prediction_without_poll_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "p1", "status": "starting"})))
        .mount(&server)
        .await;

    let err = image_adapter(&server).create_prediction(&image_request()).await.unwrap_err();
    assert_eq!(err.status, 500);
}

#[tokio::test]
async fn test_full_job_polls_until_succeeded() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/models/{}/predictions", FLUX)))
        .respond_with(ResponseTemplate::new(201).set_body_json(prediction(&server, "starting", json!(null))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/predictions/p1"))
        .and(header("authorization", "Token r8_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(prediction(&server, "processing", json!(null))))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/predictions/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(prediction(
            &server,
            "succeeded",
            json!(["https://replicate.delivery/p1/out-0.webp"]),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let policy = PollPolicy::new(10, Duration::from_millis(10));
    let image_url = run_async_image_job(&image_adapter(&server), &image_request(), policy)
        .await
        .unwrap();

    assert_eq!(image_url, "https://replicate.delivery/p1/out-0.webp");
}

#[tokio::test]
async fn test_poll_unauthorized_aborts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(prediction(&server, "starting", json!(null))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/predictions/p1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let policy = PollPolicy::new(10, Duration::from_millis(10));
    let err = run_async_image_job(&image_adapter(&server), &image_request(), policy)
        .await
        .unwrap_err();

    assert_eq!(err.status, 401);
}

#[tokio::test]
async fn test_poll_forbidden_aborts_as_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(prediction(&server, "starting", json!(null))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/predictions/p1"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "Forbidden"})))
        .expect(1)
        .mount(&server)
        .await;

    let policy = PollPolicy::new(10, Duration::from_millis(10));
    let err = run_async_image_job(&image_adapter(&server), &image_request(), policy)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Auth);
    assert_eq!(err.status, 401);
    assert_eq!(err.message, "Image generation failed. Check your Replicate API key in Settings.");
}

#[tokio::test]
async fn test_poll_server_error_is_500() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/predictions/p1"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let poll_url = format!("{}/predictions/p1", server.uri());
    let err = image_adapter(&server)
        .fetch_prediction(&poll_url, "r8_test")
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Internal);
    assert_eq!(err.status, 500);
    assert_eq!(err.message, "Failed to check generation status");
}
