//! Webhook processing: from raw request bytes to a created successor task.
//!
//! A delivery moves through these stages:
//! 1. Verify the HMAC signature against the client secret (403 on failure).
//! 2. Parse the JSON envelope (400 on failure).
//! 3. Keep only `item:completed` events (204 otherwise), decode the task
//!    (400 if it is not one), and keep only pinned tasks (204 otherwise).
//! 4. Advance the title and derive the idempotency key.
//! 5. Ask Todoist to create the successor.
//!
//! A Todoist error response is logged and acknowledged with 204 so that the
//! webhook sender does not retry it. Failures without a Todoist response are
//! returned as [`ProcessError`] and surface as a 5xx, which the sender does
//! retry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use habits_core::event::{EventKind, NewTask, WebhookEnvelope};
use habits_core::marker::is_recurring;
use habits_core::request_id::RequestId;
use habits_core::signature;
use habits_core::title::advance_title;

use crate::todoist::{TaskApi, TaskApiError};

/// Source of the current time; injectable so tests can pin "today".
pub type Clock = fn() -> DateTime<Utc>;

/// Why a delivery was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Missing or wrong signature.
    Signature,
    /// Body is not a webhook envelope.
    Malformed,
}

/// How an accepted delivery was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    /// Not a completion of a pinned task; nothing to do.
    Ignored,
    /// The successor task was created.
    Created {
        /// Id Todoist assigned to the successor.
        task_id: String,
    },
    /// Todoist rejected the creation; logged and swallowed.
    ApiErrorAbsorbed {
        /// Status Todoist answered with.
        status: u16,
    },
}

/// Final state of a processed delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Refused before any work was done.
    Rejected(Rejection),
    /// Accepted; the sender should not redeliver.
    Acknowledged(Ack),
}

/// A failure the sender should see as a server error.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// Creating the successor failed without a Todoist error response.
    #[error("failed to create successor of task {task_id}: {source}")]
    Dispatch {
        /// The completed task whose successor could not be created.
        task_id: String,
        /// Underlying client error.
        #[source]
        source: TaskApiError,
    },
}

/// Stateless handler for webhook deliveries.
///
/// Holds only immutable configuration, so one instance can be shared
/// across concurrent requests.
pub struct WebhookProcessor {
    client_secret: Vec<u8>,
    tasks: Arc<dyn TaskApi>,
    clock: Clock,
}

impl WebhookProcessor {
    /// Creates a processor verifying with `client_secret` and creating tasks
    /// through `tasks`.
    #[must_use]
    pub fn new(client_secret: &str, tasks: Arc<dyn TaskApi>) -> Self {
        Self::with_clock(client_secret, tasks, Utc::now)
    }

    /// Like [`WebhookProcessor::new`] with an explicit clock.
    #[must_use]
    pub fn with_clock(client_secret: &str, tasks: Arc<dyn TaskApi>, clock: Clock) -> Self {
        Self {
            client_secret: client_secret.as_bytes().to_vec(),
            tasks,
            clock,
        }
    }

    /// Processes one delivery.
    ///
    /// `signature` is the raw value of the signature header, if present.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Dispatch`] when task creation fails for a
    /// reason other than a Todoist error response.
    pub async fn process(
        &self,
        raw_body: &[u8],
        signature: Option<&str>,
    ) -> Result<Outcome, ProcessError> {
        if !signature::verify(raw_body, signature, &self.client_secret) {
            tracing::warn!(
                has_signature = signature.is_some(),
                "rejecting webhook with invalid signature"
            );
            return Ok(Outcome::Rejected(Rejection::Signature));
        }

        let envelope = match WebhookEnvelope::from_slice(raw_body) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(error = %e, "rejecting unparsable webhook body");
                return Ok(Outcome::Rejected(Rejection::Malformed));
            }
        };

        if envelope.kind() != EventKind::ItemCompleted {
            tracing::debug!(event_name = %envelope.event_name, "ignoring non-completion event");
            return Ok(Outcome::Acknowledged(Ack::Ignored));
        }

        let task = match envelope.task() {
            Ok(task) => task,
            Err(e) => {
                tracing::warn!(error = %e, "rejecting completion event without a task");
                return Ok(Outcome::Rejected(Rejection::Malformed));
            }
        };
        if !is_recurring(&task.content) {
            tracing::debug!(task_id = %task.id, "completed task is not a habit");
            return Ok(Outcome::Acknowledged(Ack::Ignored));
        }

        let now = (self.clock)();
        let content = advance_title(&task.content, now.date_naive());
        let request_id = RequestId::for_task(&task, now);
        if !request_id.is_redelivery_safe() {
            tracing::warn!(
                task_id = %task.id,
                request_id = %request_id,
                "payload has no completed_at; a redelivery of this event may create a duplicate"
            );
        }

        let successor = NewTask::successor_of(&task, content);
        match self.tasks.create_task(&successor, &request_id).await {
            Ok(created) => {
                tracing::info!(
                    task_id = %task.id,
                    successor_id = %created.id,
                    request_id = %request_id,
                    user_id = %envelope.user_id,
                    "created successor habit task"
                );
                Ok(Outcome::Acknowledged(Ack::Created {
                    task_id: created.id,
                }))
            }
            Err(TaskApiError::Request { status, message }) => {
                tracing::warn!(
                    task_id = %task.id,
                    request_id = %request_id,
                    status,
                    message = %message,
                    "todoist rejected successor task; acknowledging to avoid redelivery"
                );
                Ok(Outcome::Acknowledged(Ack::ApiErrorAbsorbed { status }))
            }
            Err(source) => {
                tracing::error!(task_id = %task.id, error = %source, "successor task creation failed");
                Err(ProcessError::Dispatch {
                    task_id: task.id.clone(),
                    source,
                })
            }
        }
    }
}
