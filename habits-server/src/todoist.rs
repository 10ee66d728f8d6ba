//! Todoist task-creation client.
//!
//! The webhook flow only needs one capability from Todoist: create a task
//! under an idempotency key. [`TaskApi`] is that capability; [`TodoistClient`]
//! is the REST implementation and tests plug in their own.

use std::time::Duration;

use async_trait::async_trait;
use habits_core::event::{NewTask, Task};
use habits_core::request_id::RequestId;
use reqwest::StatusCode;

/// Header Todoist uses to deduplicate write requests.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Errors from a task-creation call.
#[derive(Debug, thiserror::Error)]
pub enum TaskApiError {
    /// Todoist answered with a non-success status.
    #[error("todoist request failed with status {status}: {message}")]
    Request {
        /// HTTP status code returned by Todoist.
        status: u16,
        /// Response body, as text.
        message: String,
    },

    /// The request never produced a response (DNS, connect, timeout, ...).
    #[error("todoist transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Todoist answered with success but the body was not a task.
    #[error("unexpected todoist response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Narrow view of the Todoist API used by the webhook flow.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Creates `task`. Repeating a call with the same `request_id` must not
    /// create a second task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskApiError::Request`] when the API rejects the call and
    /// other variants when the call could not be completed.
    async fn create_task(&self, task: &NewTask, request_id: &RequestId)
    -> Result<Task, TaskApiError>;
}

/// REST client for `POST {base_url}/tasks`.
#[derive(Debug, Clone)]
pub struct TodoistClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl TodoistClient {
    /// Creates a client for `base_url` authenticating with `token`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskApiError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self, TaskApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_http_client(http, base_url, token))
    }

    /// Creates a client around an existing [`reqwest::Client`].
    #[must_use]
    pub fn with_http_client(http: reqwest::Client, base_url: &str, token: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn tasks_url(&self) -> String {
        format!("{}/tasks", self.base_url)
    }
}

#[async_trait]
impl TaskApi for TodoistClient {
    async fn create_task(
        &self,
        task: &NewTask,
        request_id: &RequestId,
    ) -> Result<Task, TaskApiError> {
        let response = self
            .http
            .post(self.tasks_url())
            .bearer_auth(&self.token)
            .header(REQUEST_ID_HEADER, request_id.as_str())
            .json(task)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(request_error(status, body));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

fn request_error(status: StatusCode, body: String) -> TaskApiError {
    let message = if body.is_empty() {
        status.canonical_reason().unwrap_or_default().to_string()
    } else {
        body
    };
    TaskApiError::Request {
        status: status.as_u16(),
        message,
    }
}
