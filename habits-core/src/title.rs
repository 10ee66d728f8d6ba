//! Advancing the counters and dates embedded in a habit task title.
//!
//! Two bracketed forms are recognised:
//!
//! - counters: `[<digits>]` or `[<digits>/<digits>]`, where the first number
//!   is bumped by one and the bound (if any) is kept verbatim;
//! - dates: `[DDDD-DD-DD]`, replaced with the completion day.
//!
//! Both passes scan left to right and never rescan replaced text. The forms
//! are disjoint: a counter never contains `-`, a date always does.

use chrono::{NaiveDate, Utc};

/// Byte length of a `[YYYY-MM-DD]` span.
const DATE_SPAN_LEN: usize = 12;

/// Advances every counter and resets every date in `title`.
///
/// Counters are handled first, then dates. A title with neither form comes
/// back unchanged.
#[must_use]
pub fn advance_title(title: &str, today: NaiveDate) -> String {
    reset_dates(&advance_counters(title), today)
}

/// [`advance_title`] using the current UTC calendar day.
#[must_use]
pub fn advance_title_now(title: &str) -> String {
    advance_title(title, Utc::now().date_naive())
}

/// Increments the first number of every `[n]` and `[n/m]` span.
///
/// The bound `m` is descriptive only: `[364/365]` becomes `[365/365]` and
/// `[365/365]` becomes `[366/365]`.
#[must_use]
pub fn advance_counters(title: &str) -> String {
    replace_spans(title, |span| {
        let counter = Counter::parse(span)?;
        let mut replacement = format!("[{}", increment_decimal(counter.value));
        if let Some(bound) = counter.bound {
            replacement.push('/');
            replacement.push_str(bound);
        }
        replacement.push(']');
        Some((counter.len, replacement))
    })
}

/// Replaces every `[YYYY-MM-DD]` span with `[today]`.
///
/// The old digits are not checked for being a real calendar date.
#[must_use]
pub fn reset_dates(title: &str, today: NaiveDate) -> String {
    let stamp = format!("[{}]", today.format("%Y-%m-%d"));
    replace_spans(title, |span| {
        is_date_span(span.as_bytes()).then(|| (DATE_SPAN_LEN, stamp.clone()))
    })
}

/// A bracketed counter found at the start of a span.
#[derive(Debug, PartialEq, Eq)]
struct Counter<'a> {
    value: &'a str,
    bound: Option<&'a str>,
    /// Total byte length including both brackets.
    len: usize,
}

impl<'a> Counter<'a> {
    /// Parses a counter from the beginning of `span`, which starts with `[`.
    fn parse(span: &'a str) -> Option<Self> {
        let rest = span.strip_prefix('[')?;
        let value_len = leading_digits(rest);
        if value_len == 0 {
            return None;
        }
        let (value, after) = rest.split_at(value_len);

        if after.starts_with(']') {
            return Some(Self {
                value,
                bound: None,
                len: value_len + 2,
            });
        }

        let tail = after.strip_prefix('/')?;
        let bound_len = leading_digits(tail);
        if bound_len == 0 {
            return None;
        }
        let (bound, close) = tail.split_at(bound_len);
        close.starts_with(']').then_some(Self {
            value,
            bound: Some(bound),
            len: value_len + bound_len + 3,
        })
    }
}

/// Walks `title`, offering every suffix that starts with `[` to `matcher`.
///
/// On a match the matcher returns the byte length consumed and its
/// replacement; scanning resumes right after the consumed span.
fn replace_spans<F>(title: &str, matcher: F) -> String
where
    F: Fn(&str) -> Option<(usize, String)>,
{
    let mut out = String::with_capacity(title.len() + 4);
    let mut copied = 0;
    let mut pos = 0;

    while let Some(offset) = title[pos..].find('[') {
        let start = pos + offset;
        if let Some((len, replacement)) = matcher(&title[start..]) {
            out.push_str(&title[copied..start]);
            out.push_str(&replacement);
            pos = start + len;
            copied = pos;
        } else {
            pos = start + 1;
        }
    }

    out.push_str(&title[copied..]);
    out
}

fn leading_digits(s: &str) -> usize {
    s.bytes().take_while(u8::is_ascii_digit).count()
}

fn is_date_span(bytes: &[u8]) -> bool {
    bytes.len() >= DATE_SPAN_LEN
        && bytes[..DATE_SPAN_LEN]
            .iter()
            .enumerate()
            .all(|(i, b)| match i {
                0 => *b == b'[',
                5 | 8 => *b == b'-',
                11 => *b == b']',
                _ => b.is_ascii_digit(),
            })
}

/// Adds one to a non-empty string of ASCII digits.
///
/// Works on the text directly so counters never overflow. Leading zeros are
/// dropped, matching what parsing to an integer and printing would give.
fn increment_decimal(digits: &str) -> String {
    let mut out: Vec<u8> = digits.trim_start_matches('0').bytes().collect();
    let mut carry = true;
    for digit in out.iter_mut().rev() {
        if *digit == b'9' {
            *digit = b'0';
        } else {
            *digit += 1;
            carry = false;
            break;
        }
    }
    if carry {
        out.insert(0, b'1');
    }
    out.into_iter().map(char::from).collect()
}
