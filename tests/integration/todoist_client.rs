#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_panics_doc,
    clippy::future_not_send
)]

//! Tests for `TodoistClient` against an in-process fake Todoist API.
//!
//! These tests validate the outbound request shape (path, bearer token,
//! `X-Request-Id`, JSON body) and the mapping of responses onto
//! `TaskApiError` variants.

mod support;

use std::time::Duration;

use chrono::{TimeZone, Utc};
use habits_core::event::{NewTask, Task};
use habits_core::request_id::RequestId;
use habits_server::todoist::{TaskApi, TaskApiError, TodoistClient};
use support::{FakeReply, start_fake_todoist};

fn new_task() -> NewTask {
    NewTask {
        content: "🧷 Read [12/30]".to_string(),
        project_id: "2203306141".to_string(),
        section_id: Some("7025".to_string()),
        parent_id: None,
        order: 5,
        labels: vec!["books".to_string(), "evening".to_string()],
        priority: 2,
    }
}

fn request_id() -> RequestId {
    let source = Task {
        id: "2995104339".to_string(),
        content: "🧷 Read [11/30]".to_string(),
        project_id: "2203306141".to_string(),
        section_id: Some("7025".to_string()),
        parent_id: None,
        child_order: 5,
        labels: Vec::new(),
        priority: 2,
        completed_at: Some("2025-02-01T21:00:00Z".to_string()),
    };
    RequestId::for_task(&source, Utc.with_ymd_and_hms(2025, 2, 1, 21, 0, 5).unwrap())
}

fn client(base_url: &str) -> TodoistClient {
    TodoistClient::new(base_url, "secret-token", Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn sends_task_with_auth_and_request_id() {
    let (fake, base_url) = start_fake_todoist(FakeReply::Created).await;

    let created = client(&base_url)
        .create_task(&new_task(), &request_id())
        .await
        .unwrap();

    assert_eq!(created.id, "created-1");
    assert_eq!(created.content, "🧷 Read [12/30]");
    assert_eq!(created.child_order, 5);

    let requests = fake.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.authorization.as_deref(), Some("Bearer secret-token"));
    assert_eq!(
        request.request_id.as_deref(),
        Some("th-2995104339-2025-02-01T21:00:00Z")
    );
    assert_eq!(
        request.body,
        serde_json::json!({
            "content": "🧷 Read [12/30]",
            "project_id": "2203306141",
            "section_id": "7025",
            "order": 5,
            "labels": ["books", "evening"],
            "priority": 2
        })
    );
}

#[tokio::test]
async fn trailing_slash_in_base_url_is_tolerated() {
    let (fake, base_url) = start_fake_todoist(FakeReply::Created).await;

    client(&format!("{base_url}/"))
        .create_task(&new_task(), &request_id())
        .await
        .unwrap();

    assert_eq!(fake.request_count(), 1);
}

#[tokio::test]
async fn error_status_maps_to_request_error() {
    let (_fake, base_url) = start_fake_todoist(FakeReply::Status(403, "Forbidden token")).await;

    let err = client(&base_url)
        .create_task(&new_task(), &request_id())
        .await
        .unwrap_err();

    match err {
        TaskApiError::Request { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "Forbidden token");
        }
        other => panic!("expected request error, got {other:?}"),
    }
}

#[tokio::test]
async fn unexpected_success_body_is_a_decode_error() {
    let (_fake, base_url) = start_fake_todoist(FakeReply::NotATask).await;

    let err = client(&base_url)
        .create_task(&new_task(), &request_id())
        .await
        .unwrap_err();

    assert!(matches!(err, TaskApiError::Decode(_)));
}

#[tokio::test]
async fn connection_refused_is_a_transport_error() {
    let dead_addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let err = client(&format!("http://{dead_addr}/rest/v2"))
        .create_task(&new_task(), &request_id())
        .await
        .unwrap_err();

    assert!(matches!(err, TaskApiError::Transport(_)));
}
