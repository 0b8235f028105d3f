//! Integration tests for the inbound A2A message endpoint (`POST /a2a/messages`).

mod common;

use common::TestApp;
use serde_json::json;

fn identity(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": id,
        "type": "generic",
        "version": "1.0.0",
        "capabilities": [],
        "endpoint": "http://127.0.0.1:0",
    })
}

#[tokio::test]
async fn skill_request_against_unloaded_skill_returns_a_skill_response_envelope() {
    let app = TestApp::new().await;

    let message = json!({
        "id": "msg-1",
        "type": "request",
        "from": identity("caller-agent"),
        "to": identity("test-agent"),
        "priority": "normal",
        "payload": {
            "content_type": "skill/request",
            "content": {
                "skill_name": "unregistered-skill",
                "operation": "do-something",
                "parameters": {},
                "context": {},
            },
        },
    });

    let (status, body) = app.request(TestApp::post_json("/a2a/messages", &message)).await;

    assert_eq!(status, 200);
    assert_eq!(body["type"], "response");
    let response_payload = &body["payload"]["content"];
    assert_eq!(response_payload["success"], false);
    assert!(response_payload["error"].as_str().unwrap().len() > 0);
}

#[tokio::test]
async fn malformed_skill_request_payload_is_rejected() {
    let app = TestApp::new().await;

    let message = json!({
        "id": "msg-2",
        "type": "request",
        "from": identity("caller-agent"),
        "to": identity("test-agent"),
        "priority": "normal",
        "payload": {
            "content_type": "skill/request",
            "content": { "not_a_valid_field": true },
        },
    });

    let (status, body) = app.request(TestApp::post_json("/a2a/messages", &message)).await;

    assert_eq!(status, 400);
    assert_eq!(body["kind"], "ProtocolError");
}

#[tokio::test]
async fn capability_advertisement_is_acknowledged() {
    let app = TestApp::new().await;

    let message = json!({
        "id": "msg-3",
        "type": "capability",
        "from": identity("caller-agent"),
        "to": identity("test-agent"),
        "priority": "normal",
        "payload": { "content_type": "capability/advertisement", "content": {} },
    });

    let (status, _body) = app.request(TestApp::post_json("/a2a/messages", &message)).await;

    assert_eq!(status, 202);
}

#[tokio::test]
async fn unsupported_message_type_is_rejected() {
    let app = TestApp::new().await;

    let message = json!({
        "id": "msg-4",
        "type": "error",
        "from": identity("caller-agent"),
        "to": identity("test-agent"),
        "priority": "normal",
        "payload": { "content_type": "error/report", "content": {} },
    });

    let (status, body) = app.request(TestApp::post_json("/a2a/messages", &message)).await;

    assert_eq!(status, 400);
    assert_eq!(body["kind"], "ProtocolError");
}
