//! Degraded continuations when the backend is unreachable.
//!
//! These tests point the client at a closed local port; the connection
//! is refused immediately, which exercises the same failure paths as a
//! down backend without touching the network.

use dialer_client::{fallback_agent, ApiClient};
use dialer_types::{ExportFormat, Message, Role};
use std::time::Duration;

fn unreachable_client() -> ApiClient {
    // Port 9 (discard) is a safe closed port on loopback.
    ApiClient::new("http://127.0.0.1:9/api", Duration::from_millis(500)).unwrap()
}

#[tokio::test]
async fn routing_failure_yields_the_fixed_fallback_agent() {
    let client = unreachable_client();
    let routed = client.route_call("I need help with my bill").await;
    assert_eq!(routed, fallback_agent());
}

#[tokio::test]
async fn chat_failure_is_surfaced_to_the_caller() {
    let client = unreachable_client();
    let result = client
        .chat("Hello", &[], "assistant", &Default::default())
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn export_falls_back_to_local_rendering() {
    let client = unreachable_client();
    let conversation = vec![
        Message::new(Role::User, "Hi", 1_000),
        Message::new(Role::Assistant, "Hello, how can I help you today?", 2_000),
    ];

    let bytes = client
        .export_transcript(&conversation, ExportFormat::Json)
        .await
        .unwrap();
    let back: Vec<Message> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(back, conversation);

    let txt = client
        .export_transcript(&conversation, ExportFormat::Txt)
        .await
        .unwrap();
    assert!(String::from_utf8(txt).unwrap().contains("USER: Hi"));
}
