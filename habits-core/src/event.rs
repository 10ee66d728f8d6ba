//! Webhook payload and task-creation types.
//!
//! Field names follow Todoist's snake_case webhook format. Only the fields the
//! receiver uses are modelled; everything else in the payload is ignored.

use serde::{Deserialize, Deserializer, Serialize};

/// Event name Todoist sends when a task is checked off.
pub const ITEM_COMPLETED: &str = "item:completed";

/// Default Todoist priority (p4, "no priority").
const DEFAULT_PRIORITY: u8 = 1;

/// Errors from decoding a webhook body.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// The body is not JSON or does not have the envelope shape.
    #[error("invalid webhook payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Kind of webhook event, derived from `event_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// `item:completed`
    ItemCompleted,
    /// Any other event name, kept for logging.
    Other(String),
}

impl EventKind {
    /// Classifies a raw `event_name`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        if name == ITEM_COMPLETED {
            Self::ItemCompleted
        } else {
            Self::Other(name.to_string())
        }
    }
}

/// Snapshot of a task as embedded in a webhook's `event_data`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Task {
    /// Task identifier.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Task title.
    pub content: String,
    /// Owning project.
    #[serde(deserialize_with = "string_or_number")]
    pub project_id: String,
    /// Section within the project, if any.
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub section_id: Option<String>,
    /// Parent task for sub-tasks.
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub parent_id: Option<String>,
    /// Position among siblings.
    #[serde(default)]
    pub child_order: i64,
    /// Label names.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Priority, 1 (normal) to 4 (urgent).
    #[serde(default = "default_priority")]
    pub priority: u8,
    /// RFC 3339 completion time; only present on completed tasks.
    #[serde(default)]
    pub completed_at: Option<String>,
}

/// The top-level webhook document.
///
/// `event_data` stays untyped until the event kind is known: its shape
/// depends on the event (task, project, note, ...).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebhookEnvelope {
    /// Event name such as `item:completed`.
    pub event_name: String,
    /// Todoist user that triggered the event.
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
    /// The object the event is about.
    pub event_data: serde_json::Value,
}

impl WebhookEnvelope {
    /// Decodes an envelope from the raw request body.
    ///
    /// Only the envelope itself is checked here; see [`WebhookEnvelope::task`].
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Malformed`] if the body is not valid JSON or is
    /// missing envelope fields.
    pub fn from_slice(raw_body: &[u8]) -> Result<Self, EventError> {
        Ok(serde_json::from_slice(raw_body)?)
    }

    /// The event kind of this delivery.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        EventKind::from_name(&self.event_name)
    }

    /// Decodes `event_data` as a task snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Malformed`] if `event_data` lacks the task fields.
    pub fn task(&self) -> Result<Task, EventError> {
        Ok(Task::deserialize(&self.event_data)?)
    }
}

/// Request body for creating a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTask {
    /// Title of the new task.
    pub content: String,
    /// Project to create it in.
    pub project_id: String,
    /// Section, omitted when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
    /// Parent task, omitted when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Position among siblings.
    pub order: i64,
    /// Label names.
    pub labels: Vec<String>,
    /// Priority, 1 to 4.
    pub priority: u8,
}

impl NewTask {
    /// A successor for `task` with a new title and everything else carried over.
    #[must_use]
    pub fn successor_of(task: &Task, content: String) -> Self {
        Self {
            content,
            project_id: task.project_id.clone(),
            section_id: task.section_id.clone(),
            parent_id: task.parent_id.clone(),
            order: task.child_order,
            labels: task.labels.clone(),
            priority: task.priority,
        }
    }
}

const fn default_priority() -> u8 {
    DEFAULT_PRIORITY
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    StringOrNumber::deserialize(deserializer).map(String::from)
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?
        .map(String::from)
        .filter(|s| !s.is_empty()))
}
