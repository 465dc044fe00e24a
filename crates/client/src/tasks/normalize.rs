//! Free-text to task list normalization.
//!
//! The upstream generation endpoint may answer with a JSON array, a fenced
//! code block, a Markdown bullet list, a numbered list, or loose prose. This
//! module deterministically extracts an ordered list of short task strings
//! from any of those shapes. Best effort, never errors.
//!
//! Precedence: a raw top-level JSON array wins outright; everything else
//! goes through the cleanup pass. Fence-wrapped JSON is therefore handled by
//! the cleanup pass (the fences make the raw parse fail), which strips the
//! fences, brackets and quotes and recovers the items line by line.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Leading fenced-code-block opener, optionally tagged `json`.
static FENCE_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^```(?:json)?\s*\n?").unwrap());

/// Trailing fenced-code-block closer.
static FENCE_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n?```\s*$").unwrap());

/// One leading `[` and one trailing `]` at the string boundaries.
static OUTER_BRACKETS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[|\]$").unwrap());

/// JSON-style `", "` separators between quoted items.
static JSON_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""\s*,\s*""#).unwrap());

/// A quote at the start or end of each line.
static LINE_QUOTES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?m)^"|"$"#).unwrap());

/// Optional leading list marker (dash/asterisk/bullet, or ordinal + `.`/`)`),
/// then the task text. The marker arm requires trailing whitespace, so a line
/// that is only a marker is captured verbatim as its own text.
static LINE_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:[-*•]\s+|\d+[.)]\s+)?(.+)$").unwrap());

/// Extract an ordered list of task strings from free-form text.
///
/// Returns an empty list when nothing can be extracted; callers distinguish
/// "nothing found" from "goal was empty" before calling.
pub fn normalize(text: &str) -> Vec<String> {
    let trimmed = text.trim();

    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
        return items.iter().map(display_string).filter(|s| !s.is_empty()).collect();
    }

    let clean = FENCE_OPEN.replace(trimmed, "");
    let clean = FENCE_CLOSE.replace(&clean, "");
    let clean = OUTER_BRACKETS.replace_all(&clean, "");
    let clean = JSON_SEPARATORS.replace_all(&clean, "\n");
    let clean = LINE_QUOTES.replace_all(&clean, "");

    let mut tasks = Vec::new();
    for line in clean.trim().split('\n') {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(captures) = LINE_MARKER.captures(line)
            && let Some(text) = captures.get(1)
        {
            let task = text.as_str().trim();
            if !task.is_empty() {
                tasks.push(task.to_string());
            }
        }
    }
    tasks
}

/// Display string of one JSON array element: strings verbatim, everything
/// else as its JSON text (`null` stays "null" and is kept; only empty
/// strings are dropped by the caller).
fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
