//! End-to-end tests against the in-process router.
//!
//! These tests run the full HTTP stack around a real dispatcher. Timer
//! behavior is checked on paused tokio time.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::{json, Value};

use callboard_server::api::WsMessage;
use common::{advance, TestFixture};

fn waiting_ids(body: &Value) -> Vec<String> {
    body["waiting"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["ticket"]["id"].as_str().unwrap().to_string())
        .collect()
}

fn archive_ids(body: &Value) -> Vec<String> {
    body["archive"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["ticket"]["id"].as_str().unwrap().to_string())
        .collect()
}

async fn enroll(fixture: &TestFixture, id: &str) {
    let response = fixture
        .post(
            "/api/v1/queue/tickets",
            json!({ "id": id, "subject": format!("Patient {}", id) }),
        )
        .await;
    assert_status!(response, StatusCode::CREATED);
}

// =============================================================================
// Basic API Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_endpoint() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/config").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["dispatch"]["priority_delay_ms"], 5000);
    assert_eq!(response.body["dispatch"]["normal_delay_ms"], 10000);
    assert_eq!(response.body["registration"]["counters"], json!(["1", "2", "3"]));
}

#[tokio::test]
async fn test_empty_queue() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/queue").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["active"], false);
    assert_eq!(response.body["phase"], "idle");
    assert!(response.body["current"].is_null());
    assert_eq!(response.body["waiting"], json!([]));
    assert_eq!(response.body["archive"], json!([]));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    enroll(&fixture, "C001").await;

    let (status, body) = fixture.get_text("/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("callboard_queue_waiting"));
    assert!(body.contains("callboard_tickets_enrolled_total"));
}

// =============================================================================
// Enrollment
// =============================================================================

#[tokio::test]
async fn test_enroll_orders_priority_first() {
    let fixture = TestFixture::new();
    enroll(&fixture, "C001").await;
    enroll(&fixture, "P001").await;
    enroll(&fixture, "C002").await;
    enroll(&fixture, "P002").await;

    let response = fixture.get("/api/v1/queue").await;
    assert_eq!(
        waiting_ids(&response.body),
        vec!["P001", "P002", "C001", "C002"]
    );
}

#[tokio::test]
async fn test_enroll_returns_ticket() {
    let fixture = TestFixture::new();
    let response = fixture
        .post(
            "/api/v1/queue/tickets",
            json!({ "id": "p007", "subject": "Ana", "counter_label": "Room 4" }),
        )
        .await;

    assert_status!(response, StatusCode::CREATED);
    assert_eq!(response.body["id"], "P007");
    assert_eq!(response.body["priority_class"], "priority");
    assert_eq!(response.body["counter_label"], "Room 4");
}

#[tokio::test]
async fn test_enroll_duplicate_conflicts() {
    let fixture = TestFixture::new();
    enroll(&fixture, "C001").await;

    let response = fixture
        .post(
            "/api/v1/queue/tickets",
            json!({ "id": "C001", "subject": "Someone else" }),
        )
        .await;
    assert_status!(response, StatusCode::CONFLICT);
    assert!(response.body["error"].as_str().unwrap().contains("C001"));

    let queue = fixture.get("/api/v1/queue").await;
    assert_eq!(waiting_ids(&queue.body), vec!["C001"]);
}

#[tokio::test]
async fn test_enroll_bad_code() {
    let fixture = TestFixture::new();

    for id in ["X001", "P1", "C1234", ""] {
        let response = fixture
            .post("/api/v1/queue/tickets", json!({ "id": id, "subject": "Ana" }))
            .await;
        assert_status!(response, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_enroll_class_mismatch() {
    let fixture = TestFixture::new();
    let response = fixture
        .post(
            "/api/v1/queue/tickets",
            json!({ "id": "C001", "subject": "Ana", "priority_class": "priority" }),
        )
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn test_register_patient() {
    let fixture = TestFixture::new();
    let response = fixture
        .post(
            "/api/v1/registrations",
            json!({ "name": "josé da silva", "age": 72, "gender": "m" }),
        )
        .await;

    assert_status!(response, StatusCode::CREATED);
    assert_eq!(response.body["ticket"]["id"], "P001");
    assert_eq!(response.body["ticket"]["subject"], "José Da Silva");
    assert_eq!(response.body["ticket"]["counter_label"], "1");
    assert_eq!(response.body["patient"]["gender"], "male");
    assert_eq!(response.body["patient"]["specialty"], "senior");

    let queue = fixture.get("/api/v1/queue").await;
    assert_eq!(waiting_ids(&queue.body), vec!["P001"]);
}

#[tokio::test]
async fn test_register_invalid_form() {
    let fixture = TestFixture::new();

    for form in [
        json!({ "name": "al", "age": 30, "gender": "F" }),
        json!({ "name": "alice", "age": 0, "gender": "F" }),
        json!({ "name": "alice", "age": 121, "gender": "F" }),
        json!({ "name": "alice", "age": 30, "gender": "X" }),
    ] {
        let response = fixture.post("/api/v1/registrations", form).await;
        assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.body["error"].is_string());
    }

    let queue = fixture.get("/api/v1/queue").await;
    assert!(waiting_ids(&queue.body).is_empty());
}

#[tokio::test]
async fn test_register_collides_with_manual_enrollment() {
    let fixture = TestFixture::new();
    enroll(&fixture, "C001").await;

    let response = fixture
        .post(
            "/api/v1/registrations",
            json!({ "name": "alice", "age": 30, "gender": "F" }),
        )
        .await;
    assert_status!(response, StatusCode::CONFLICT);
}

// =============================================================================
// Manual control
// =============================================================================

#[tokio::test]
async fn test_select_ticket() {
    let fixture = TestFixture::new();
    enroll(&fixture, "P001").await;
    enroll(&fixture, "C001").await;

    let response = fixture.post_empty("/api/v1/queue/select/C001").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["selected"], true);
    assert_eq!(response.body["current"]["ticket"]["id"], "C001");
    assert_eq!(response.body["current"]["state"], "current");
    assert_eq!(waiting_ids(&response.body), vec!["P001"]);
}

#[tokio::test]
async fn test_select_unknown_ticket_is_noop() {
    let fixture = TestFixture::new();
    enroll(&fixture, "P001").await;
    let before = fixture.get("/api/v1/queue").await;

    let response = fixture.post_empty("/api/v1/queue/select/C999").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["selected"], false);

    let after = fixture.get("/api/v1/queue").await;
    assert_eq!(before.body, after.body);
}

#[tokio::test]
async fn test_select_malformed_code() {
    let fixture = TestFixture::new();
    let response = fixture.post_empty("/api/v1/queue/select/nope").await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_call_next_archives_current() {
    let fixture = TestFixture::new();
    enroll(&fixture, "C001").await;
    enroll(&fixture, "C002").await;

    let first = fixture.post_empty("/api/v1/queue/next").await;
    assert_status!(first, StatusCode::OK);
    assert_eq!(first.body["current"]["ticket"]["id"], "C001");

    let second = fixture.post_empty("/api/v1/queue/next").await;
    assert_eq!(second.body["current"]["ticket"]["id"], "C002");
    assert_eq!(archive_ids(&second.body), vec!["C001"]);

    let third = fixture.post_empty("/api/v1/queue/next").await;
    assert!(third.body["current"].is_null());
    assert_eq!(archive_ids(&third.body), vec!["C001", "C002"]);

    let history = fixture.get("/api/v1/queue/history").await;
    assert_eq!(history.body["total"], 2);
    assert_eq!(history.body["entries"][0]["ticket"]["id"], "C001");
}

// =============================================================================
// Timed dispatch
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_start_and_stop() {
    let fixture = TestFixture::new();

    let response = fixture.post_empty("/api/v1/queue/start").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["active"], true);
    assert_eq!(response.body["phase"], "empty");

    let response = fixture.post_empty("/api/v1/queue/stop").await;
    assert_eq!(response.body["active"], false);
    assert_eq!(response.body["phase"], "idle");
}

#[tokio::test(start_paused = true)]
async fn test_timed_dispatch_over_http() {
    let fixture = TestFixture::new();
    enroll(&fixture, "C001").await;
    enroll(&fixture, "P001").await;
    fixture.post_empty("/api/v1/queue/start").await;

    advance(Duration::from_secs(5)).await;
    let queue = fixture.get("/api/v1/queue").await;
    assert_eq!(queue.body["phase"], "serving");
    assert_eq!(queue.body["current"]["ticket"]["id"], "P001");

    advance(Duration::from_secs(10)).await;
    let queue = fixture.get("/api/v1/queue").await;
    assert_eq!(queue.body["phase"], "waiting_for_current");
    assert_eq!(archive_ids(&queue.body), vec!["P001"]);

    advance(Duration::from_secs(10)).await;
    let queue = fixture.get("/api/v1/queue").await;
    assert_eq!(queue.body["current"]["ticket"]["id"], "C001");
}

#[tokio::test(start_paused = true)]
async fn test_queue_events_reach_websocket_broadcaster() {
    let fixture = TestFixture::new();
    let mut ws_rx = fixture.state.ws_broadcaster().subscribe();
    let _forwarder = fixture
        .state
        .ws_broadcaster()
        .forward(fixture.state.dispatcher().subscribe());

    enroll(&fixture, "P001").await;
    fixture.post_empty("/api/v1/queue/next").await;
    advance(Duration::from_millis(1)).await;

    let mut messages = Vec::new();
    while let Ok(msg) = ws_rx.try_recv() {
        messages.push(msg);
    }
    assert!(matches!(messages[0], WsMessage::TicketEnrolled { .. }));
    assert!(matches!(messages[1], WsMessage::TicketCalled { .. }));
}
