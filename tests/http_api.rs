//! End-to-end tests of the HTTP API against an in-memory runtime.

#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use guild_eventlog::config::EventlogConfig;
use guild_eventlog::domain::EventlogNotice;
use guild_eventlog::persistence::{EventStore, InMemoryEventStore};
use guild_eventlog::runtime::EventlogRuntime;
use serde_json::{Value, json};

struct TestServer {
    base: String,
    runtime: EventlogRuntime,
    client: reqwest::Client,
}

async fn spawn_server() -> TestServer {
    let config = EventlogConfig {
        persistence_enabled: false,
        eventlog_channels: vec![("g1".to_string(), "c1".to_string())],
        eventlog_disabled_guilds: vec!["off".to_string()],
        worker_count: 2,
        ..EventlogConfig::default()
    };
    let store: Arc<dyn EventStore> = Arc::new(InMemoryEventStore::new());
    let runtime = EventlogRuntime::build(&config, store);
    let app = runtime.router();

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("failed to bind test listener");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("listener has no address");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    TestServer {
        base: format!("http://{addr}"),
        runtime,
        client: reqwest::Client::new(),
    }
}

async fn wait_for_notice(rx: &mut tokio::sync::broadcast::Receiver<EventlogNotice>) -> EventlogNotice {
    match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
        Ok(Ok(notice)) => notice,
        other => panic!("no notice received: {other:?}"),
    }
}

async fn get_json(server: &TestServer, path: &str) -> (u16, Value) {
    let Ok(resp) = server.client.get(format!("{}{path}", server.base)).send().await else {
        panic!("GET {path} failed");
    };
    let status = resp.status().as_u16();
    let Ok(body) = resp.json::<Value>().await else {
        panic!("GET {path} returned no JSON");
    };
    (status, body)
}

async fn post_json(server: &TestServer, path: &str, body: &Value) -> (u16, Value) {
    let Ok(resp) = server
        .client
        .post(format!("{}{path}", server.base))
        .json(body)
        .send()
        .await
    else {
        panic!("POST {path} failed");
    };
    let status = resp.status().as_u16();
    let Ok(body) = resp.json::<Value>().await else {
        panic!("POST {path} returned no JSON");
    };
    (status, body)
}

#[tokio::test]
async fn health_reports_healthy() {
    let server = spawn_server().await;
    let (status, body) = get_json(&server, "/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn notification_is_recorded_and_queryable() {
    let server = spawn_server().await;
    let mut notices = server.runtime.outcomes().subscribe();

    let change = json!({
        "type": "channel_create",
        "channel": { "id": "ch1", "guild_id": "g1", "name": "general", "type": 0 }
    });
    let (status, body) = post_json(&server, "/api/v1/notifications", &change).await;
    assert_eq!(status, 202);
    assert_eq!(body["action"], "channel_create");
    assert!(matches!(
        wait_for_notice(&mut notices).await,
        EventlogNotice::Recorded { .. }
    ));

    let (status, body) = get_json(&server, "/api/v1/guilds/g1/events").await;
    assert_eq!(status, 200);
    assert_eq!(body["count"], 1);
    let record = &body["data"][0];
    assert_eq!(record["target_id"], "ch1");
    assert_eq!(record["attribution"], "waiting");
    assert_eq!(record["display_refs"][0]["surface_id"], "c1");
    assert_eq!(record["options"][0], json!({"key": "channel_name", "value": "general"}));

    let Some(id) = record["id"].as_str() else {
        panic!("record id missing");
    };
    let (status, single) = get_json(&server, &format!("/api/v1/events/{id}")).await;
    assert_eq!(status, 200);
    assert_eq!(single["action_type"], "channel_create");

    let (status, pending) = get_json(&server, "/api/v1/backfill").await;
    assert_eq!(status, 200);
    assert_eq!(pending["data"][0], json!({"guild_id": "g1", "kind": "channel_create"}));
}

#[tokio::test]
async fn disabled_guild_is_suppressed() {
    let server = spawn_server().await;
    let mut notices = server.runtime.outcomes().subscribe();

    let change = json!({ "type": "ban_add", "guild_id": "off", "user": { "id": "u1" } });
    let (status, _) = post_json(&server, "/api/v1/notifications", &change).await;
    assert_eq!(status, 202);
    assert!(matches!(
        wait_for_notice(&mut notices).await,
        EventlogNotice::Suppressed { .. }
    ));

    let (_, body) = get_json(&server, "/api/v1/guilds/off/events").await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn unknown_event_is_not_found() {
    let server = spawn_server().await;
    let (status, body) = get_json(
        &server,
        "/api/v1/events/00000000-0000-4000-8000-000000000000",
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], 2001);
}

#[tokio::test]
async fn audit_log_push_attributes_waiting_record() {
    let server = spawn_server().await;
    let mut notices = server.runtime.outcomes().subscribe();

    let change = json!({ "type": "ban_add", "guild_id": "g1", "user": { "id": "u9" } });
    let _ = post_json(&server, "/api/v1/notifications", &change).await;
    let _ = wait_for_notice(&mut notices).await;

    let push = json!({
        "entries": [{
            "kind": "ban_add",
            "target_id": "u9",
            "user_id": "mod1",
            "reason": "spam",
            "created_at": chrono::Utc::now().to_rfc3339()
        }]
    });
    let (status, body) = post_json(&server, "/api/v1/guilds/g1/audit-log", &push).await;
    assert_eq!(status, 202);
    assert_eq!(body["accepted"], 1);

    let Ok(report) = server.runtime.reconciler().run_once().await else {
        panic!("reconciliation failed");
    };
    assert_eq!(report.attributed, 1);

    let (_, body) = get_json(&server, "/api/v1/guilds/g1/events").await;
    assert_eq!(body["data"][0]["user_id"], "mod1");
    assert_eq!(body["data"][0]["reason"], "spam");
    assert_eq!(body["data"][0]["attribution"], "attributed");
}

#[tokio::test]
async fn unknown_backfill_kind_is_rejected() {
    let server = spawn_server().await;
    let push = json!({
        "entries": [{
            "kind": "member_update",
            "target_id": "u9",
            "user_id": "mod1",
            "created_at": chrono::Utc::now().to_rfc3339()
        }]
    });
    let (status, body) = post_json(&server, "/api/v1/guilds/g1/audit-log", &push).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], 1002);
}

#[tokio::test]
async fn shutdown_drains_then_rejects_notifications() {
    let server = spawn_server().await;
    let failures = server.runtime.spawn_failure_watch();

    let change = json!({ "type": "ban_add", "guild_id": "g1", "user": { "id": "u2" } });
    let (status, _) = post_json(&server, "/api/v1/notifications", &change).await;
    assert_eq!(status, 202);

    server.runtime.shutdown().await;
    let (_, body) = get_json(&server, "/api/v1/guilds/g1/events").await;
    assert_eq!(body["count"], 1);

    let (status, body) = post_json(&server, "/api/v1/notifications", &change).await;
    assert_eq!(status, 503);
    assert_eq!(body["error"]["code"], 5004);

    let Ok(Ok(tally)) = tokio::time::timeout(Duration::from_secs(5), failures).await else {
        panic!("failure watch should stop on shutdown");
    };
    assert_eq!(tally.total(), 0);
}
