use httpmock::prelude::*;
use tarot_reader::config::llm::{Backend, LlmConfig, Platform};
use tarot_reader::core::session::translate_query;
use tarot_reader::core::{BufferSink, ChatMessage, Narrator, Translator};
use tarot_reader::{OpenAiChatClient, TarotError};

fn client_for(server: &MockServer) -> OpenAiChatClient {
    OpenAiChatClient::new(&LlmConfig {
        backend: Backend::Ollama,
        platform: Platform::Other("linux".to_string()),
        model: "gemma3:4b-it-qat".to_string(),
        base_url: server.url("/v1/"),
        api_key: "test-key".to_string(),
        temperature: 0.9,
    })
}

#[tokio::test]
async fn test_translate_uses_non_streaming_completion() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .header("authorization", "Bearer test-key")
            .body_contains("\"stream\":false")
            .body_contains("gemma3:4b-it-qat");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "  Will my new job go well?\n"}}]
            }));
    });

    let client = client_for(&server);
    assert_eq!(client.endpoint(), server.url("/v1/chat/completions"));

    let translated = client.translate("新しい仕事はうまくいきますか").await.unwrap();
    mock.assert();
    assert_eq!(translated, "Will my new job go well?");
}

#[tokio::test]
async fn test_stream_collects_delta_content() {
    let server = MockServer::start();
    let sse = concat!(
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"過去の\"}}]}\n\n",
        ": keep-alive\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"影響が\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"残っています。\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .body_contains("\"stream\":true");
        then.status(200)
            .header("Content-Type", "text/event-stream")
            .body(sse);
    });

    let client = client_for(&server);
    let mut sink = BufferSink::default();
    let messages = [
        ChatMessage::system("あなたはタロット占い師です。"),
        ChatMessage::user("カードを解説してください。"),
    ];

    let text = client.stream(&messages, &mut sink).await.unwrap();
    mock.assert();
    assert_eq!(text, "過去の影響が残っています。");
    assert_eq!(sink.text, text);
}

#[tokio::test]
async fn test_server_error_is_a_collaborator_failure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(500).body("model not loaded");
    });

    let client = client_for(&server);
    let mut sink = BufferSink::default();
    let err = client
        .stream(&[ChatMessage::user("hello")], &mut sink)
        .await
        .unwrap_err();

    match err {
        TarotError::Collaborator { message, .. } => {
            assert!(message.contains("500"));
            assert!(message.contains("model not loaded"));
        }
        other => panic!("expected collaborator error, got {:?}", other),
    }
    assert!(sink.text.is_empty());
}

#[tokio::test]
async fn test_failed_translation_falls_back_to_blank_query() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(503);
    });

    let client = client_for(&server);
    assert_eq!(translate_query(&client, "恋愛運は？").await, "");
    mock.assert();

    // 空白的問題不會呼叫翻譯
    assert_eq!(translate_query(&client, "   ").await, "");
    mock.assert_hits(1);
}

#[tokio::test]
async fn test_error_event_mid_stream_fails_the_stage() {
    let server = MockServer::start();
    let sse = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"途中まで\"}}]}\n\n",
        "data: {\"error\":{\"message\":\"model crashed\",\"type\":\"server_error\"}}\n\n",
        "data: [DONE]\n\n",
    );
    server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .body_contains("\"stream\":true");
        then.status(200)
            .header("Content-Type", "text/event-stream")
            .body(sse);
    });

    let client = client_for(&server);
    let mut sink = BufferSink::default();
    let err = client
        .stream(&[ChatMessage::user("hello")], &mut sink)
        .await
        .unwrap_err();

    match err {
        TarotError::Collaborator { message, .. } => assert!(message.contains("model crashed")),
        other => panic!("expected collaborator error, got {:?}", other),
    }
    assert_eq!(sink.text, "途中まで");
}
