//! Detection of recurring "habit" tasks.

/// The safety pin glyph (U+1F9F7) that flags a task as a habit.
pub const SAFETY_PIN: char = '\u{1F9F7}';

/// Returns `true` if the task title carries the [`SAFETY_PIN`] marker.
///
/// Plain containment: the glyph may appear anywhere in the title.
#[must_use]
pub fn is_recurring(title: &str) -> bool {
    title.contains(SAFETY_PIN)
}
