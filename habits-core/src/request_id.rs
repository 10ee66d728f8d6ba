//! Idempotency keys for successor-task creation.
//!
//! Todoist deduplicates task creation by the `X-Request-Id` header. The key is
//! `th-{task_id}-{distinguisher}`: redelivering the same completion must give
//! the same key, while completing the habit again later must not.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::event::Task;

/// Prefix shared by every key this service generates.
pub const REQUEST_ID_PREFIX: &str = "th";

/// Where the distinguishing part of a [`RequestId`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestIdSource {
    /// The task's `completed_at`; stable across redeliveries.
    CompletedAt,
    /// Processing time, used when the payload has no `completed_at`.
    /// A redelivery gets a different key, so Todoist cannot deduplicate it.
    WallClock,
}

/// An idempotency key together with how it was derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId {
    value: String,
    source: RequestIdSource,
}

impl RequestId {
    /// Derives the key for creating the successor of `task`.
    ///
    /// `now` is only consulted when the task carries no completion time.
    #[must_use]
    pub fn for_task(task: &Task, now: DateTime<Utc>) -> Self {
        match task.completed_at.as_deref().filter(|s| !s.is_empty()) {
            Some(completed_at) => Self {
                value: build_request_id(&task.id, completed_at),
                source: RequestIdSource::CompletedAt,
            },
            None => Self {
                value: build_request_id(
                    &task.id,
                    &now.to_rfc3339_opts(SecondsFormat::Millis, true),
                ),
                source: RequestIdSource::WallClock,
            },
        }
    }

    /// The header value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// How the key was derived.
    #[must_use]
    pub const fn source(&self) -> RequestIdSource {
        self.source
    }

    /// `true` if redeliveries of the same event map to the same key.
    #[must_use]
    pub const fn is_redelivery_safe(&self) -> bool {
        matches!(self.source, RequestIdSource::CompletedAt)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

/// Formats `th-{task_id}-{distinguisher}`.
#[must_use]
pub fn build_request_id(task_id: &str, distinguisher: &str) -> String {
    format!("{REQUEST_ID_PREFIX}-{task_id}-{distinguisher}")
}
