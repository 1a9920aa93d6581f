//! Chat client behaviour against an in-process HTTP stub.

use std::time::Duration;

use ai_llm_service::{
    AiLlmError, LlmModelConfig, LlmProvider, LlmServiceProfiles, ProviderError, ProviderErrorKind,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

/// Serves exactly one request with the given status line and body, returning
/// the raw request text through the join handle.
async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let request = read_request(&mut sock).await;
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        sock.write_all(response.as_bytes()).await.unwrap();
        sock.shutdown().await.ok();
        request
    });
    (format!("http://{addr}"), handle)
}

async fn read_request(sock: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = sock.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .find_map(|l| {
                    let (k, v) = l.split_once(':')?;
                    k.eq_ignore_ascii_case("content-length")
                        .then(|| v.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn profile(endpoint: String, timeout_secs: u64) -> LlmModelConfig {
    LlmModelConfig {
        provider: LlmProvider::OpenAI,
        model: "google/gemma-3-27b-it:free".into(),
        endpoint,
        api_key: Some("sk-test".into()),
        max_tokens: Some(700),
        temperature: Some(0.3),
        top_p: Some(0.9),
        frequency_penalty: Some(0.1),
        presence_penalty: Some(0.1),
        timeout_secs: Some(timeout_secs),
    }
}

#[tokio::test]
async fn success_returns_trimmed_content_and_sends_both_messages() {
    let (endpoint, server) = serve_once(
        "200 OK",
        r#"{"choices":[{"message":{"content":"  Ответ по правилам.  "}}],"usage":{"total_tokens":42}}"#,
    )
    .await;
    let basic = profile(endpoint, 5);
    let svc = LlmServiceProfiles::new(basic.clone(), basic, None);

    let out = svc
        .generate_basic("ВОПРОС ПОЛЬЗОВАТЕЛЯ: тест", Some("Ты помощник"))
        .await
        .unwrap();
    assert_eq!(out, "Ответ по правилам.");

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /v1/chat/completions"));
    assert!(request.to_ascii_lowercase().contains("authorization: bearer sk-test"));
    assert!(request.contains(r#""role":"system""#));
    assert!(request.contains(r#""role":"user""#));
    assert!(request.contains(r#""presence_penalty""#));
}

#[tokio::test]
async fn non_success_status_is_reported_with_snippet() {
    let (endpoint, _server) =
        serve_once("429 Too Many Requests", r#"{"error":"rate limited"}"#).await;
    let basic = profile(endpoint, 5);
    let svc = LlmServiceProfiles::new(basic.clone(), basic, None);

    let err = svc.generate_basic("q", None).await.unwrap_err();
    match err {
        AiLlmError::Provider(ProviderError {
            kind: ProviderErrorKind::HttpStatus(h),
            ..
        }) => {
            assert_eq!(h.status.as_u16(), 429);
            assert!(h.snippet.contains("rate limited"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn empty_choices_are_an_error() {
    let (endpoint, _server) = serve_once("200 OK", r#"{"choices":[]}"#).await;
    let basic = profile(endpoint, 5);
    let svc = LlmServiceProfiles::new(basic.clone(), basic, None);

    let err = svc.generate_basic("q", None).await.unwrap_err();
    assert!(matches!(
        err,
        AiLlmError::Provider(ProviderError {
            kind: ProviderErrorKind::EmptyChoices,
            ..
        })
    ));
}

#[tokio::test]
async fn unresponsive_upstream_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    let _server = tokio::spawn(async move {
        let (_sock, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let basic = profile(endpoint, 1);
    let svc = LlmServiceProfiles::new(basic.clone(), basic, None);

    let err = svc.generate_basic("q", None).await.unwrap_err();
    assert!(matches!(err, AiLlmError::Timeout(d) if d == Duration::from_secs(1)));
}

#[tokio::test]
async fn ollama_embedding_profile_round_trips_through_the_service() {
    let (endpoint, server) = serve_once("200 OK", r#"{"embedding":[0.25,-0.5,1.0]}"#).await;
    let embedding = LlmModelConfig {
        provider: LlmProvider::Ollama,
        model: "all-minilm".into(),
        endpoint,
        api_key: None,
        max_tokens: None,
        temperature: Some(0.0),
        top_p: None,
        frequency_penalty: None,
        presence_penalty: None,
        timeout_secs: Some(5),
    };
    let svc = LlmServiceProfiles::with_embedding_only(embedding);

    let v = svc.embed("Как удалить учебник?").await.unwrap();
    assert_eq!(v, vec![0.25, -0.5, 1.0]);

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/embeddings"));
    assert!(request.contains(r#""model":"all-minilm""#));
}
