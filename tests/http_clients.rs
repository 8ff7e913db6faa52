// HTTP tests for the X client and the Discord webhook against wiremock.
//
// These cover the wire format of every request the forwarder makes and
// how non-success responses surface.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use xforward::discord::dispatch::Dispatcher;
use xforward::discord::embed::{format_frame, PermalinkPolicy, WebhookMessage};
use xforward::discord::traits::WebhookSink;
use xforward::discord::webhook::DiscordWebhook;
use xforward::stream::supervisor::{CycleOutcome, Sleeper, Supervisor};
use xforward::x::client::XClient;
use xforward::x::rules::sync_rules;

const RULES_PATH: &str = "/2/tweets/search/stream/rules";
const STREAM_PATH: &str = "/2/tweets/search/stream";

fn frame_json() -> serde_json::Value {
    json!({
        "data": {
            "id": "1",
            "text": "hello",
            "author_id": "u1",
            "created_at": "2024-01-01T00:00:00Z",
            "attachments": {"media_keys": ["m1", "m2"]}
        },
        "includes": {
            "users": [{"id": "u1", "username": "alice", "name": "Alice"}],
            "media": [
                {"media_key": "m1", "type": "video"},
                {"media_key": "m2", "type": "photo", "url": "u2"}
            ]
        }
    })
}

fn client(server: &MockServer) -> XClient {
    XClient::new(&server.uri(), "test-token").unwrap()
}

struct NoSleep;

#[async_trait]
impl Sleeper for NoSleep {
    async fn sleep(&self, _duration: Duration) {}
}

#[tokio::test]
async fn list_rules_sends_bearer_and_parses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RULES_PATH))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "10", "value": "from:alice", "tag": "alice"}],
            "meta": {"sent": "2024-01-01T00:00:00.000Z", "result_count": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let rules = client(&server).list_rules().await.unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].id, "10");
    assert_eq!(rules[0].tag.as_deref(), Some("alice"));
}

#[tokio::test]
async fn list_rules_without_data_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RULES_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"meta": {"result_count": 0}})),
        )
        .mount(&server)
        .await;

    assert!(client(&server).list_rules().await.unwrap().is_empty());
}

#[tokio::test]
async fn sync_rules_deletes_then_adds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RULES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "1", "value": "from:old"},
                {"id": "2", "value": "from:older", "tag": "older"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(RULES_PATH))
        .and(body_json(json!({"delete": {"ids": ["1", "2"]}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"meta": {}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(RULES_PATH))
        .and(body_json(json!({"add": [
            {"value": "from:alice", "tag": "alice"},
            {"value": "from:bob", "tag": "bob"}
        ]})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"meta": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let handles = vec!["alice".to_string(), "bob".to_string()];
    let installed = sync_rules(&client(&server), &handles).await.unwrap();
    assert_eq!(installed, 2);
}

#[tokio::test]
async fn failed_delete_is_tolerated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RULES_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": "1", "value": "x"}]})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(RULES_PATH))
        .and(body_json(json!({"delete": {"ids": ["1"]}})))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(RULES_PATH))
        .and(body_json(json!({"add": [{"value": "from:alice", "tag": "alice"}]})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    assert!(sync_rules(&client(&server), &["alice".to_string()]).await.is_ok());
}

#[tokio::test]
async fn failed_add_carries_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RULES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(RULES_PATH))
        .respond_with(
            ResponseTemplate::new(400).set_body_string(r#"{"title":"Invalid Request"}"#),
        )
        .mount(&server)
        .await;

    let err = sync_rules(&client(&server), &["alice".to_string()])
        .await
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("Failed to set rules"), "got: {msg}");
    assert!(msg.contains("Invalid Request"), "got: {msg}");
}

#[tokio::test]
async fn failed_rule_read_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RULES_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(RULES_PATH))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let err = sync_rules(&client(&server), &["alice".to_string()])
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("401"), "got: {err:#}");
}

#[tokio::test]
async fn open_stream_requests_expansions_and_yields_body() {
    let server = MockServer::start().await;
    let body = format!("\r\n{}\r\n", frame_json());
    Mock::given(method("GET"))
        .and(path(STREAM_PATH))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param("expansions", "author_id,attachments.media_keys"))
        .and(query_param("media.fields", "url,preview_image_url,type"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.clone()))
        .mount(&server)
        .await;

    let mut chunks = client(&server).open_stream().await.unwrap();
    let mut received = Vec::new();
    while let Some(chunk) = chunks.next().await {
        received.extend(chunk.unwrap());
    }
    assert_eq!(String::from_utf8(received).unwrap(), body);
}

#[tokio::test]
async fn open_stream_error_status_includes_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STREAM_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Connections"))
        .mount(&server)
        .await;

    let err = match client(&server).open_stream().await {
        Ok(_) => panic!("expected an error"),
        Err(e) => e.to_string(),
    };
    assert!(err.contains("429"), "got: {err}");
    assert!(err.contains("Too Many Connections"), "got: {err}");
}

#[tokio::test]
async fn fetch_post_formats_like_a_stream_frame() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/tweets/1"))
        .and(query_param("tweet.fields", "created_at,author_id,attachments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(frame_json()))
        .expect(1)
        .mount(&server)
        .await;

    let frame = client(&server).fetch_post("1").await.unwrap();
    let message = format_frame(&frame, PermalinkPolicy::Body).unwrap();
    let embed = &message.embeds[0];
    assert_eq!(embed.author.name, "Alice (@alice)");
    assert_eq!(embed.image.as_ref().map(|i| i.url.as_str()), Some("u2"));
}

#[tokio::test]
async fn fetch_post_not_found_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/tweets/404"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    assert!(client(&server).fetch_post("404").await.is_err());
}

#[tokio::test]
async fn webhook_posts_message_json() {
    let server = MockServer::start().await;
    let frame = serde_json::from_value(frame_json()).unwrap();
    let message = format_frame(&frame, PermalinkPolicy::LinkField).unwrap();

    Mock::given(method("POST"))
        .and(path("/api/webhooks/1/abc"))
        .and(body_json(serde_json::to_value(&message).unwrap()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let webhook = DiscordWebhook::new(&format!("{}/api/webhooks/1/abc", server.uri())).unwrap();
    webhook.deliver(&message).await.unwrap();
}

#[tokio::test]
async fn webhook_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Invalid Form Body"))
        .mount(&server)
        .await;

    let frame = serde_json::from_value(frame_json()).unwrap();
    let message = format_frame(&frame, PermalinkPolicy::Body).unwrap();
    let webhook = DiscordWebhook::new(&server.uri()).unwrap();
    let err = webhook.deliver(&message).await.unwrap_err().to_string();
    assert!(err.contains("Invalid Form Body"), "got: {err}");
}

#[tokio::test]
async fn stream_to_webhook_end_to_end() {
    let x_server = MockServer::start().await;
    let discord_server = MockServer::start().await;

    let body = format!("\r\nnot json\n{}\n\r\n", frame_json());
    Mock::given(method("GET"))
        .and(path(STREAM_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&x_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&discord_server)
        .await;

    let webhook = Arc::new(DiscordWebhook::new(&format!("{}/hook", discord_server.uri())).unwrap());
    let mut supervisor = Supervisor::new(
        Arc::new(client(&x_server)),
        Dispatcher::new(webhook, PermalinkPolicy::Body),
        Box::new(NoSleep),
        Duration::from_secs(5),
    );

    let outcomes = supervisor.run_cycles(1).await;
    assert!(matches!(outcomes[0], CycleOutcome::Ended));
    assert_eq!(supervisor.stats().payloads, 1);
    assert_eq!(supervisor.stats().ignored, 1);

    // Delivery is detached from the read loop; poll until it lands
    let mut requests = Vec::new();
    for _ in 0..40 {
        requests = discord_server.received_requests().await.unwrap_or_default();
        if !requests.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(requests.len(), 1);

    let posted: WebhookMessage = serde_json::from_slice(&requests[0].body).unwrap();
    let embed = &posted.embeds[0];
    assert_eq!(embed.author.name, "Alice (@alice)");
    assert!(embed.description.contains("hello"));
    assert!(embed.description.contains("/alice/status/1"));
    assert_eq!(embed.image.as_ref().map(|i| i.url.as_str()), Some("u2"));
}
