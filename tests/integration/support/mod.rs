//! Shared helpers for the integration tests: a fake Todoist REST API and a
//! signed-payload builder.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use parking_lot::Mutex;
use serde_json::{Value, json};

/// A request the fake API received.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub authorization: Option<String>,
    pub request_id: Option<String>,
    pub body: Value,
}

/// How the fake answers `POST /rest/v2/tasks`.
#[derive(Debug, Clone)]
pub enum FakeReply {
    /// 200 with the created task echoed back.
    Created,
    /// The given status with a plain-text body.
    Status(u16, &'static str),
    /// 200 with a body that is not a task.
    NotATask,
}

/// In-process stand-in for the Todoist REST API.
pub struct FakeTodoist {
    requests: Mutex<Vec<CapturedRequest>>,
    reply: FakeReply,
}

impl FakeTodoist {
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

/// Starts the fake API on an OS-assigned port and returns it together with
/// its base URL (`http://127.0.0.1:<port>/rest/v2`).
pub async fn start_fake_todoist(reply: FakeReply) -> (Arc<FakeTodoist>, String) {
    let fake = Arc::new(FakeTodoist {
        requests: Mutex::new(Vec::new()),
        reply,
    });

    let app = axum::Router::new()
        .route("/rest/v2/tasks", axum::routing::post(create_task))
        .with_state(Arc::clone(&fake));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (fake, format!("http://{addr}/rest/v2"))
}

async fn create_task(
    State(fake): State<Arc<FakeTodoist>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let count = {
        let mut requests = fake.requests.lock();
        requests.push(CapturedRequest {
            authorization: header("authorization"),
            request_id: header("x-request-id"),
            body: body.clone(),
        });
        requests.len()
    };

    match fake.reply {
        FakeReply::Created => {
            let mut task = body;
            task["id"] = Value::from(format!("created-{count}"));
            task["child_order"] = task["order"].clone();
            (StatusCode::OK, Json(task)).into_response()
        }
        FakeReply::Status(code, message) => (
            StatusCode::from_u16(code).unwrap(),
            message.to_string(),
        )
            .into_response(),
        FakeReply::NotATask => (StatusCode::OK, Json(json!({"unexpected": true}))).into_response(),
    }
}

/// A webhook body for a task with the given event name and content.
pub fn webhook_body(event_name: &str, content: &str, completed_at: Option<&str>) -> Vec<u8> {
    let mut data = json!({
        "id": "6X7rM8997g3RQmvh",
        "content": content,
        "project_id": "6Jf8VQXxpwv56VQ7",
        "section_id": null,
        "parent_id": "6X7rfFVPjhvv84XG",
        "child_order": 2,
        "labels": ["garden"],
        "priority": 4,
        "checked": true
    });
    if let Some(at) = completed_at {
        data["completed_at"] = Value::from(at);
    }
    serde_json::to_vec(&json!({
        "event_name": event_name,
        "user_id": 2_671_355,
        "version": "9",
        "event_data": data
    }))
    .unwrap()
}
