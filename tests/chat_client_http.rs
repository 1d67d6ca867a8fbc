//! `ChatClient` against a local HTTP stub: request bodies and retry policy.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use realtor::llm::{ChatClient, ChatClientBuilder, LlmError};
use serde_json::Value;

/// A request as the stub server saw it.
struct Captured {
    head: String,
    body: Value,
}

/// Serves one scripted `(status, body)` per connection, then stops listening.
fn serve(responses: Vec<(u16, String)>) -> (String, Arc<Mutex<Vec<Captured>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}/v1", listener.local_addr().unwrap());
    let captured = Arc::new(Mutex::new(Vec::new()));

    let seen = Arc::clone(&captured);
    thread::spawn(move || {
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().unwrap();
            stream
                .set_read_timeout(Some(Duration::from_secs(5)))
                .unwrap();

            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':')
                    && name.eq_ignore_ascii_case("content-length")
                {
                    content_length = value.trim().parse().unwrap();
                }
                head.push_str(&line);
            }
            let mut raw = vec![0; content_length];
            reader.read_exact(&mut raw).unwrap();

            seen.lock().unwrap().push(Captured {
                head,
                body: serde_json::from_slice(&raw).unwrap(),
            });

            let response = format!(
                "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        }
    });

    (base_url, captured)
}

fn completion(text: &str) -> String {
    serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": text}}]
    })
    .to_string()
}

fn client(base_url: &str) -> ChatClient {
    ChatClientBuilder::new()
        .base_url(base_url)
        .api_key("sk-test")
        .model("deepseek-chat")
        .retry_delays([Duration::ZERO; 3])
        .build()
        .unwrap()
}

#[test]
fn ping_sends_the_greeting_with_a_small_token_cap() {
    let (base_url, captured) = serve(vec![(200, completion("Of course!"))]);

    let reply = client(&base_url).ping().unwrap();
    assert_eq!(reply, "Of course!");

    let requests = captured.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(request.head.starts_with("POST /v1/chat/completions "));
    assert!(request.head.to_ascii_lowercase().contains("authorization: bearer sk-test"));
    assert_eq!(request.body["model"], "deepseek-chat");
    assert_eq!(request.body["max_tokens"], 50);
    assert_eq!(request.body["messages"].as_array().unwrap().len(), 1);
    assert_eq!(request.body["messages"][0]["role"], "user");
    assert_eq!(
        request.body["messages"][0]["content"],
        "Hello! Can you help with real estate?"
    );
}

#[test]
fn rate_limits_and_server_errors_are_retried() {
    let (base_url, captured) = serve(vec![
        (429, r#"{"error":"slow down"}"#.to_string()),
        (503, r#"{"error":"overloaded"}"#.to_string()),
        (200, completion("Happy to help.")),
    ]);

    let reply = client(&base_url).ping().unwrap();
    assert_eq!(reply, "Happy to help.");

    let requests = captured.lock().unwrap();
    assert_eq!(requests.len(), 3);
    // Every attempt resends the same request
    assert!(requests.iter().all(|r| r.body == requests[0].body));
}

#[test]
fn client_errors_are_not_retried() {
    let (base_url, captured) = serve(vec![(401, r#"{"error":"bad key"}"#.to_string())]);

    let result = client(&base_url).ping();
    match result {
        Err(LlmError::Http { status, body }) => {
            assert_eq!(status, 401);
            assert!(body.contains("bad key"));
        }
        other => panic!("expected HTTP 401, got {other:?}"),
    }
    assert_eq!(captured.lock().unwrap().len(), 1);
}

#[test]
fn persistent_server_errors_give_up_after_the_last_delay() {
    let failures = (0..4)
        .map(|_| (500, r#"{"error":"boom"}"#.to_string()))
        .collect();
    let (base_url, captured) = serve(failures);

    let result = client(&base_url).ping();
    assert!(matches!(result, Err(LlmError::Http { status: 500, .. })));
    // The first try plus one retry per delay
    assert_eq!(captured.lock().unwrap().len(), 4);
}
