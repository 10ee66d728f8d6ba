//! Timeless Habits webhook server library.
//!
//! Exposes the server pieces for use in tests and embedding. The server
//! receives Todoist webhooks, and when a pinned habit task is completed it
//! asks Todoist to create the next occurrence.

pub mod config;
pub mod server;
pub mod todoist;
pub mod webhook;
