// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway tests: REST and SSE through `Router::oneshot`, the socket
//! protocol against a live listener.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tower::ServiceExt;
use wadi_gateway::{
    build_router, ConnectionRegistry, GatewayState, HealthState, InMemoryConnectionRegistry,
    StaticTokenAuth, WsSettings,
};
use wadi_test_utils::{MockEmbedder, MockReply, TestHarness};

const TOKEN: &str = "tok-alice";

fn gateway_state(h: &TestHarness, registry: Arc<InMemoryConnectionRegistry>) -> GatewayState {
    let tokens = HashMap::from([
        (TOKEN.to_string(), "alice".to_string()),
        ("tok-bob".to_string(), "bob".to_string()),
    ]);
    GatewayState {
        orchestrator: h.orchestrator.clone(),
        auth: Arc::new(StaticTokenAuth::new(tokens)),
        registry,
        ws: WsSettings {
            heartbeat_interval: Duration::from_secs(30),
            auth_timeout: Duration::from_millis(300),
        },
        health: HealthState {
            start_time: std::time::Instant::now(),
            prometheus_render: Some(Arc::new(|| "wadi_runs_total 0\n".to_string())),
        },
    }
}

fn state(h: &TestHarness) -> GatewayState {
    gateway_state(h, Arc::new(InMemoryConnectionRegistry::new()))
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(state: GatewayState, req: Request<Body>) -> (StatusCode, String) {
    let response = build_router(state).oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn send_json(state: GatewayState, req: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(state, req).await;
    (status, serde_json::from_str(&body).unwrap())
}

#[tokio::test]
async fn health_and_metrics_are_public() {
    let h = TestHarness::builder().build().await.unwrap();

    let (status, body) = send_json(state(&h), request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, text) = send(state(&h), request("GET", "/metrics", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(text.contains("wadi_runs_total"));
}

#[tokio::test]
async fn api_requires_known_bearer_token() {
    let h = TestHarness::builder().build().await.unwrap();

    let (status, body) = send_json(state(&h), request("GET", "/v1/credits", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) =
        send_json(state(&h), request("GET", "/v1/credits", Some("wrong"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_run_returns_receipt() {
    let h = TestHarness::builder()
        .with_balance("alice", 5)
        .with_mock_responses(vec!["hi there".into()])
        .build()
        .await
        .unwrap();

    let (status, body) = send_json(
        state(&h),
        request(
            "POST",
            "/v1/projects/p1/runs",
            Some(TOKEN),
            Some(json!({"input": "hello", "model": "gpt-3.5-turbo"})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["run"]["output"], "hi there");
    assert_eq!(body["run"]["status"], "complete");
    assert_eq!(body["run"]["user_id"], "alice");
    assert_eq!(body["credits_used"], 1);
    assert_eq!(body["credits_remaining"], 4);

    let (_, balance) = send_json(state(&h), request("GET", "/v1/credits", Some(TOKEN), None)).await;
    assert_eq!(balance["balance"], 4);

    let (_, history) = send_json(
        state(&h),
        request("GET", "/v1/credits/history?limit=1", Some(TOKEN), None),
    )
    .await;
    let entries = history["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["kind"], "debit");
    assert_eq!(entries[0]["reason"], "generation");
}

#[tokio::test]
async fn insufficient_credits_is_402() {
    let h = TestHarness::builder()
        .with_balance("alice", 3)
        .build()
        .await
        .unwrap();

    let (status, body) = send_json(
        state(&h),
        request(
            "POST",
            "/v1/projects/p1/runs",
            Some(TOKEN),
            Some(json!({"input": "hello", "model": "gpt-4"})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["code"], "INSUFFICIENT_CREDITS");
    assert_eq!(body["required"], 10);
    assert_eq!(body["available"], 3);
}

#[tokio::test]
async fn invalid_input_is_400() {
    let h = TestHarness::builder()
        .with_balance("alice", 3)
        .build()
        .await
        .unwrap();

    let (status, body) = send_json(
        state(&h),
        request(
            "POST",
            "/v1/projects/p1/runs",
            Some(TOKEN),
            Some(json!({"input": "", "model": "gpt-3.5-turbo"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn provider_failure_is_500_with_details() {
    let h = TestHarness::builder()
        .with_balance("alice", 3)
        .with_mock_replies(vec![MockReply::error("model overloaded")])
        .build()
        .await
        .unwrap();

    let (status, body) = send_json(
        state(&h),
        request(
            "POST",
            "/v1/projects/p1/runs",
            Some(TOKEN),
            Some(json!({"input": "hello", "model": "gpt-3.5-turbo"})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "AI_GENERATION_ERROR");
    assert_eq!(body["details"]["model"], "gpt-3.5-turbo");
    assert!(body["details"]["timestamp"].is_string());
    assert_eq!(h.balance("alice").await, 3);
}

#[tokio::test]
async fn runs_are_listed_and_private() {
    let h = TestHarness::builder()
        .with_balance("alice", 5)
        .build()
        .await
        .unwrap();
    h.create_run("alice", "p1", "first", "gpt-3.5-turbo").await.unwrap();
    let receipt = h.create_run("alice", "p1", "hello", "gpt-3.5-turbo").await.unwrap();

    let (status, body) = send_json(
        state(&h),
        request("GET", "/v1/projects/p1/runs?limit=1", Some(TOKEN), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["runs"].as_array().unwrap().len(), 1);
    assert_eq!(body["runs"][0]["id"], receipt.run.id.as_str());
    assert_eq!(body["total"], 2);

    let (_, body) = send_json(
        state(&h),
        request("GET", "/v1/projects/p1/runs", Some("tok-bob"), None),
    )
    .await;
    assert_eq!(body["total"], 0);

    let uri = format!("/v1/runs/{}", receipt.run.id);
    let (status, _) = send_json(state(&h), request("GET", &uri, Some(TOKEN), None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_json(state(&h), request("GET", &uri, Some("tok-bob"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn closing_session_starts_a_new_one() {
    let h = TestHarness::builder()
        .with_balance("alice", 5)
        .build()
        .await
        .unwrap();
    let first = h.create_run("alice", "p1", "hello", "gpt-3.5-turbo").await.unwrap();

    let req = request("DELETE", "/v1/projects/p1/session", Some(TOKEN), None);
    let (status, body) = send_json(state(&h), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["closed"], true);

    let req = request("DELETE", "/v1/projects/p1/session", Some(TOKEN), None);
    let (_, body) = send_json(state(&h), req).await;
    assert_eq!(body["closed"], false);

    let second = h.create_run("alice", "p1", "again", "gpt-3.5-turbo").await.unwrap();
    assert_ne!(first.run.session_id, second.run.session_id);
}

#[tokio::test]
async fn sse_streams_chunks_then_complete() {
    let h = TestHarness::builder()
        .with_balance("alice", 5)
        .with_mock_responses(vec!["hi there".into()])
        .build()
        .await
        .unwrap();

    let response = build_router(state(&h))
        .oneshot(request(
            "POST",
            "/v1/projects/p1/runs/stream",
            Some(TOKEN),
            Some(json!({"input": "hello", "model": "gpt-3.5-turbo"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    let events: Vec<Value> = text
        .lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).unwrap())
        .collect();

    let chunks: String = events
        .iter()
        .filter(|e| e["type"] == "chunk")
        .map(|e| e["content"].as_str().unwrap())
        .collect();
    assert_eq!(chunks, "hi there");
    let last = events.last().unwrap();
    assert_eq!(last["type"], "complete");
    assert_eq!(last["run"]["output"], "hi there");
    assert_eq!(h.balance("alice").await, 4);
}

#[tokio::test]
async fn sse_reports_credit_errors_before_streaming() {
    let h = TestHarness::builder().build().await.unwrap();

    let (status, body) = send_json(
        state(&h),
        request(
            "POST",
            "/v1/projects/p1/runs/stream",
            Some(TOKEN),
            Some(json!({"input": "hello", "model": "gpt-3.5-turbo"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["code"], "INSUFFICIENT_CREDITS");
}

#[tokio::test]
async fn sse_provider_error_event() {
    let h = TestHarness::builder()
        .with_balance("alice", 5)
        .with_mock_replies(vec![MockReply::PartialThenError {
            chunks: vec!["par".into()],
            message: "stream broke".into(),
        }])
        .build()
        .await
        .unwrap();

    let (status, text) = send(
        state(&h),
        request(
            "POST",
            "/v1/projects/p1/runs/stream",
            Some(TOKEN),
            Some(json!({"input": "hello", "model": "gpt-3.5-turbo"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let last: Value = text
        .lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).unwrap())
        .last()
        .unwrap();
    assert_eq!(last["type"], "error");
    assert!(last["message"].as_str().unwrap().contains("stream broke"));
    assert_eq!(h.balance("alice").await, 5);
}

#[tokio::test]
async fn memory_endpoints_round_trip() {
    let h = TestHarness::builder()
        .with_memory(
            MockEmbedder::new()
                .with_vector("rust tips", vec![1.0, 0.0])
                .with_vector("cooking", vec![0.0, 1.0])
                .with_vector("rust?", vec![1.0, 0.1]),
        )
        .build()
        .await
        .unwrap();

    for content in ["rust tips", "cooking"] {
        let (status, body) = send_json(
            state(&h),
            request(
                "POST",
                "/v1/projects/p1/memories",
                Some(TOKEN),
                Some(json!({"content": content})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["id"].is_string());
    }

    let (status, body) = send_json(
        state(&h),
        request(
            "POST",
            "/v1/projects/p1/memories/search",
            Some(TOKEN),
            Some(json!({"query": "rust?"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["content"], "rust tips");
    assert!(results[0]["similarity"].as_f64().unwrap() > 0.9);

    let (status, body) = send_json(
        state(&h),
        request("DELETE", "/v1/projects/p1/memories", Some(TOKEN), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 2);
}

#[tokio::test]
async fn mis_sized_embedding_is_rejected_and_search_keeps_working() {
    let h = TestHarness::builder()
        .with_memory(
            MockEmbedder::new()
                .with_vector("rust tips", vec![1.0, 0.0])
                .with_vector("rust?", vec![1.0, 0.1]),
        )
        .build()
        .await
        .unwrap();

    let store = |body: Value| request("POST", "/v1/projects/p1/memories", Some(TOKEN), Some(body));
    let (status, _) = send_json(state(&h), store(json!({"content": "rust tips"}))).await;
    assert_eq!(status, StatusCode::CREATED);

    for embedding in [json!([1.0, 2.0, 3.0]), json!([])] {
        let (status, body) = send_json(
            state(&h),
            store(json!({"content": "junk", "embedding": embedding})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    let (status, body) = send_json(
        state(&h),
        request(
            "POST",
            "/v1/projects/p1/memories/search",
            Some(TOKEN),
            Some(json!({"query": "rust?"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn memory_run_link_must_belong_to_caller() {
    let h = TestHarness::builder()
        .with_balance("bob", 5)
        .with_memory(MockEmbedder::new())
        .build()
        .await
        .unwrap();
    let bobs = h.create_run("bob", "p1", "hello", "gpt-3.5-turbo").await.unwrap();

    for run_id in [bobs.run.id.as_str(), "no-such-run"] {
        let (status, body) = send_json(
            state(&h),
            request(
                "POST",
                "/v1/projects/p1/memories",
                Some(TOKEN),
                Some(json!({"content": "note", "run_id": run_id})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    let (status, _) = send_json(
        state(&h),
        request(
            "POST",
            "/v1/projects/p1/memories",
            Some("tok-bob"),
            Some(json!({"content": "note", "run_id": bobs.run.id})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn memory_endpoints_unavailable_when_disabled() {
    let h = TestHarness::builder().build().await.unwrap();
    let (status, body) = send_json(
        state(&h),
        request(
            "POST",
            "/v1/projects/p1/memories/search",
            Some(TOKEN),
            Some(json!({"query": "x"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "EMBEDDING_ERROR");
}

// --- Socket protocol ---

type Client =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn spawn_server(state: GatewayState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .unwrap();
    client
}

async fn send_ws(client: &mut Client, value: Value) {
    client.send(WsMessage::text(value.to_string())).await.unwrap();
}

/// Next JSON message, skipping control frames. `None` once the socket closes.
async fn recv_ws(client: &mut Client) -> Option<Value> {
    loop {
        let next = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("socket message within 5s");
        match next {
            Some(Ok(WsMessage::Text(text))) => return Some(serde_json::from_str(&text).unwrap()),
            Some(Ok(WsMessage::Close(_))) | None | Some(Err(_)) => return None,
            Some(Ok(_)) => continue,
        }
    }
}

#[tokio::test]
async fn socket_requires_auth_before_run() {
    let h = TestHarness::builder()
        .with_balance("alice", 5)
        .build()
        .await
        .unwrap();
    let addr = spawn_server(state(&h)).await;
    let mut client = connect(addr).await;

    send_ws(&mut client, json!({"type": "ping"})).await;
    assert_eq!(recv_ws(&mut client).await.unwrap()["type"], "pong");

    send_ws(
        &mut client,
        json!({"type": "run", "projectId": "p1", "input": "hi", "model": "gpt-4o", "requestId": "r1"}),
    )
    .await;
    let err = recv_ws(&mut client).await.unwrap();
    assert_eq!(err["type"], "error");
    assert_eq!(err["requestId"], "r1");
    assert_eq!(err["code"], "UNAUTHORIZED");

    send_ws(&mut client, json!({"type": "auth", "token": "bad"})).await;
    assert_eq!(recv_ws(&mut client).await.unwrap()["error"], "invalid token");
    assert_eq!(h.balance("alice").await, 5);
}

#[tokio::test]
async fn socket_auth_timeout_closes_connection() {
    let h = TestHarness::builder().build().await.unwrap();
    let addr = spawn_server(state(&h)).await;
    let mut client = connect(addr).await;

    let err = recv_ws(&mut client).await.unwrap();
    assert_eq!(err["error"], "authentication timeout");
    assert!(recv_ws(&mut client).await.is_none());
}

#[tokio::test]
async fn socket_run_streams_and_registers_connection() {
    let h = TestHarness::builder()
        .with_balance("alice", 5)
        .with_mock_responses(vec!["hello back".into()])
        .build()
        .await
        .unwrap();
    let registry = Arc::new(InMemoryConnectionRegistry::new());
    let addr = spawn_server(gateway_state(&h, registry.clone())).await;
    let mut client = connect(addr).await;

    send_ws(&mut client, json!({"type": "auth", "token": TOKEN})).await;
    let authed = recv_ws(&mut client).await.unwrap();
    assert_eq!(authed, json!({"type": "authenticated", "userId": "alice"}));
    assert_eq!(registry.list_by_user("alice").await.len(), 1);

    send_ws(
        &mut client,
        json!({"type": "run", "projectId": "p1", "input": "hi", "model": "gpt-3.5-turbo", "requestId": "r1"}),
    )
    .await;

    let mut content = String::new();
    let complete = loop {
        let message = recv_ws(&mut client).await.unwrap();
        assert_eq!(message["requestId"], "r1");
        match message["type"].as_str().unwrap() {
            "status" => assert_eq!(message["status"], "started"),
            "chunk" => content.push_str(message["content"].as_str().unwrap()),
            "complete" => break message,
            other => panic!("unexpected message type {other}: {message}"),
        }
    };
    assert_eq!(content, "hello back");
    assert_eq!(complete["run"]["output"], "hello back");
    assert_eq!(h.balance("alice").await, 4);

    client.close(None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(registry.list_by_user("alice").await.is_empty());
}

#[tokio::test]
async fn socket_stop_marks_run_stopped() {
    let h = TestHarness::builder()
        .with_balance("alice", 5)
        .with_mock_replies(vec![MockReply::PartialThenHang {
            chunks: vec!["first ".into()],
        }])
        .build()
        .await
        .unwrap();
    let addr = spawn_server(state(&h)).await;
    let mut client = connect(addr).await;

    send_ws(&mut client, json!({"type": "auth", "token": TOKEN})).await;
    recv_ws(&mut client).await.unwrap();

    send_ws(
        &mut client,
        json!({"type": "run", "projectId": "p1", "input": "hi", "model": "gpt-3.5-turbo", "requestId": "r9"}),
    )
    .await;
    assert_eq!(recv_ws(&mut client).await.unwrap()["status"], "started");
    assert_eq!(recv_ws(&mut client).await.unwrap()["content"], "first ");

    send_ws(&mut client, json!({"type": "stop", "requestId": "r9"})).await;
    let stopped = recv_ws(&mut client).await.unwrap();
    assert_eq!(stopped["type"], "status");
    assert_eq!(stopped["status"], "stopped");

    let runs = h.orchestrator.list_runs("alice", "p1", None).await.unwrap();
    assert_eq!(runs[0].status, wadi_core::RunStatus::Stopped);
    assert_eq!(runs[0].output, "first ");
    assert_eq!(h.balance("alice").await, 4);

    send_ws(&mut client, json!({"type": "stop", "requestId": "r9"})).await;
    assert_eq!(recv_ws(&mut client).await.unwrap()["code"], "NOT_FOUND");
}

#[tokio::test]
async fn socket_stop_still_answers_when_run_cannot_be_saved() {
    let h = TestHarness::builder()
        .with_balance("alice", 5)
        .with_mock_replies(vec![MockReply::PartialThenHang {
            chunks: vec!["first ".into()],
        }])
        .build()
        .await
        .unwrap();
    let addr = spawn_server(state(&h)).await;
    let mut client = connect(addr).await;

    send_ws(&mut client, json!({"type": "auth", "token": TOKEN})).await;
    recv_ws(&mut client).await.unwrap();

    send_ws(
        &mut client,
        json!({"type": "run", "projectId": "p1", "input": "hi", "model": "gpt-3.5-turbo", "requestId": "r1"}),
    )
    .await;
    assert_eq!(recv_ws(&mut client).await.unwrap()["status"], "started");
    assert_eq!(recv_ws(&mut client).await.unwrap()["content"], "first ");

    h.db
        .connection()
        .call(|conn| conn.execute_batch("ALTER TABLE runs RENAME TO runs_gone"))
        .await
        .unwrap();

    send_ws(&mut client, json!({"type": "stop", "requestId": "r1"})).await;
    let last = recv_ws(&mut client).await.unwrap();
    assert_eq!(last["type"], "status");
    assert_eq!(last["status"], "stopped");
    assert_eq!(last["requestId"], "r1");
}

#[tokio::test]
async fn socket_heartbeat_pings_and_stays_open() {
    let h = TestHarness::builder().build().await.unwrap();
    let mut gateway = state(&h);
    gateway.ws.heartbeat_interval = Duration::from_millis(50);
    let addr = spawn_server(gateway).await;
    let mut client = connect(addr).await;

    send_ws(&mut client, json!({"type": "auth", "token": TOKEN})).await;
    assert_eq!(recv_ws(&mut client).await.unwrap()["type"], "authenticated");

    let mut pings = 0;
    while pings < 3 {
        let next = tokio::time::timeout(Duration::from_secs(2), client.next())
            .await
            .expect("heartbeat within 2s");
        match next {
            Some(Ok(WsMessage::Ping(_))) => pings += 1,
            Some(Ok(WsMessage::Text(_))) => {}
            other => panic!("expected ping, got {other:?}"),
        }
    }

    // Pongs are not required; the socket must outlive the missed deadlines.
    tokio::time::sleep(Duration::from_millis(200)).await;
    send_ws(&mut client, json!({"type": "ping"})).await;
    assert_eq!(recv_ws(&mut client).await.unwrap()["type"], "pong");
}
