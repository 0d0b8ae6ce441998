use serde_json::json;
use shared_clients::{
    GenerationRequest, LanguageModel, ModelError, ModelRouter, OllamaClient, OpenAiCompatClient,
};
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn ollama_generate_sends_options_and_reads_response() -> Result<(), ModelError> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_json(json!({
            "model": "sqlcoder",
            "prompt": "list users",
            "stream": false,
            "options": {"temperature": 0.5, "num_predict": 64}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "SELECT * FROM users;"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OllamaClient::new(&format!("{}/api", server.uri()), 5)?;
    let reply = client
        .generate(GenerationRequest::new("list users", "sqlcoder", 64, 0.5))
        .await?;
    assert_eq!(reply, "SELECT * FROM users;");
    Ok(())
}

#[tokio::test]
async fn ollama_non_success_is_a_status_error() -> Result<(), ModelError> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = OllamaClient::new(&format!("{}/api", server.uri()), 5)?;
    let err = client
        .generate(GenerationRequest::new("p", "m", 1, 0.1))
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::Status { status: 503, .. }));
    Ok(())
}

#[tokio::test]
async fn ollama_availability_uses_prefix_match_on_tags() -> Result<(), ModelError> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"name": "codellama:7b-instruct-q4_0"}, {"name": "mistral:latest"}]
        })))
        .mount(&server)
        .await;

    let client = OllamaClient::new(&format!("{}/api", server.uri()), 5)?;
    assert!(client.is_available("codellama").await);
    assert!(client.is_available("mistral").await);
    assert!(!client.is_available("llama3").await);
    Ok(())
}

#[tokio::test]
async fn ollama_unreachable_is_unavailable() -> Result<(), ModelError> {
    let client = OllamaClient::new("http://127.0.0.1:9/api", 1)?;
    assert!(!client.is_available("anything").await);
    Ok(())
}

#[tokio::test]
async fn chat_completion_uses_bearer_auth_and_first_choice() -> Result<(), ModelError> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer secret"))
        .and(body_partial_json(json!({
            "model": "deepseek",
            "messages": [{"role": "user", "content": "design a schema"}],
            "max_tokens": 2048
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [
                {"message": {"role": "assistant", "content": "{\"tables\": []}"}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiCompatClient::new(&format!("{}/v1", server.uri()), "secret", 5)?;
    let reply = client
        .generate(GenerationRequest::new("design a schema", "deepseek", 2048, 0.3))
        .await?;
    assert_eq!(reply, "{\"tables\": []}");
    Ok(())
}

#[tokio::test]
async fn chat_completion_without_choices_is_invalid() -> Result<(), ModelError> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let client = OpenAiCompatClient::new(&server.uri(), "k", 5)?;
    let err = client
        .generate(GenerationRequest::new("p", "m", 1, 0.1))
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::InvalidResponse { .. }));
    Ok(())
}

#[tokio::test]
async fn router_sends_schema_model_to_hosted_endpoint() -> Result<(), ModelError> {
    let hosted_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "hosted"}}]
        })))
        .expect(1)
        .mount(&hosted_server)
        .await;

    let ollama_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "local"})))
        .expect(1)
        .mount(&ollama_server)
        .await;

    let router = ModelRouter::new(
        Some(OpenAiCompatClient::new(&hosted_server.uri(), "k", 5)?),
        OllamaClient::new(&format!("{}/api", ollama_server.uri()), 5)?,
        "deepseek",
    );

    let hosted = router
        .generate(GenerationRequest::new("p", "deepseek", 10, 0.3))
        .await?;
    let local = router
        .generate(GenerationRequest::new("p", "sqlcoder", 10, 0.1))
        .await?;
    assert_eq!(hosted, "hosted");
    assert_eq!(local, "local");
    assert!(router.is_available("deepseek").await);
    Ok(())
}

#[tokio::test]
async fn router_without_key_uses_ollama_for_everything() -> Result<(), ModelError> {
    let ollama_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "local"})))
        .expect(1)
        .mount(&ollama_server)
        .await;

    let mut config = common::config::ModelsConfig::default();
    config.ollama_api_base = format!("{}/api", ollama_server.uri());
    config.schema_model = "deepseek".to_string();
    let router = ModelRouter::from_config(&config)?;

    let reply = router
        .generate(GenerationRequest::new("p", "deepseek", 10, 0.3))
        .await?;
    assert_eq!(reply, "local");
    Ok(())
}
