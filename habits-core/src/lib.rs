//! Shared habit-task logic for Timeless Habits.
//!
//! Everything here is pure: no I/O, no global state. The server crate feeds
//! raw webhook bytes and configuration in and gets decisions back.

pub mod event;
pub mod marker;
pub mod request_id;
pub mod signature;
pub mod title;
