use llm_client::{ChatMessage, LlmConfig, LlmError, LlmProvider, OpenAiProvider};
use serde_json::json;
use wiremock::matchers::{bearer_token, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider_for(server: &MockServer) -> OpenAiProvider {
    let config = LlmConfig {
        api_key: "test-key".to_string(),
        base_url: format!("{}/v1", server.uri()),
        timeout_secs: 5,
        ..LlmConfig::default()
    };
    OpenAiProvider::new(config).expect("provider")
}

#[tokio::test]
async fn complete_returns_first_choice() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(bearer_token("test-key"))
        .and(body_partial_json(json!({ "model": "gpt-4o-mini" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "model": "gpt-4o-mini",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "The Sunken Keep lies east." } }
            ],
            "usage": { "prompt_tokens": 12, "completion_tokens": 7, "total_tokens": 19 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let completion = provider
        .complete(&[
            ChatMessage::system("You are a lore keeper."),
            ChatMessage::user("Where is the Sunken Keep?"),
        ])
        .await
        .expect("completion");

    assert_eq!(completion.content, "The Sunken Keep lies east.");
    assert_eq!(completion.model, "gpt-4o-mini");
    assert_eq!(completion.usage.map(|u| u.total_tokens), Some(19));
}

#[tokio::test]
async fn describe_image_sends_image_url_part_to_vision_model() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "model": "gpt-4o",
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": "List the regions" },
                    { "type": "image_url", "image_url": { "url": "https://maps.example.com/world.png" } }
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-4o",
            "choices": [{ "message": { "content": "[]" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let completion = provider
        .describe_image("https://maps.example.com/world.png", "List the regions")
        .await
        .expect("vision completion");

    assert_eq!(completion.content, "[]");
}

#[tokio::test]
async fn embed_returns_vector() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(body_partial_json(json!({
            "model": "text-embedding-3-small",
            "input": "dragon"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [{ "object": "embedding", "index": 0, "embedding": [0.25, -0.5, 1.0] }],
            "usage": { "prompt_tokens": 1, "total_tokens": 1 }
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let embedding = provider.embed("dragon").await.expect("embedding");

    assert_eq!(embedding, vec![0.25, -0.5, 1.0]);
}

#[tokio::test]
async fn non_success_status_maps_to_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = provider.embed("dragon").await.unwrap_err();

    match err {
        LlmError::Api { status, body } => {
            assert_eq!(status, 429);
            assert_eq!(body, "rate limited");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn empty_embedding_list_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = provider.embed("dragon").await.unwrap_err();

    assert!(matches!(err, LlmError::EmptyResponse("embedding")));
}

#[tokio::test]
async fn malformed_body_maps_to_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = provider
        .complete(&[ChatMessage::user("hi")])
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::Parse(_)));
}
