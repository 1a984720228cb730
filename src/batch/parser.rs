//! Splitting pasted multi-post text into work items.
//!
//! Posts are separated by a line holding only three or more dashes. A short
//! first line without sentence punctuation is taken as the author's name.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Lines of this length or longer are never treated as a name.
const MAX_NAME_CHARS: usize = 50;

static RE_DELIMITER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*-{3,}[ \t]*\r?$").expect("static regex must parse")
});

/// One post to answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchWorkItem {
    pub display_name: String,
    pub post_body: String,
}

/// Parse raw batch text into ordered work items. Empty segments are dropped.
pub fn parse_batch(raw: &str) -> Vec<BatchWorkItem> {
    RE_DELIMITER
        .split(raw)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .enumerate()
        .map(|(i, segment)| parse_segment(i, segment))
        .collect()
}

fn parse_segment(index: usize, segment: &str) -> BatchWorkItem {
    let (first, rest) = match segment.split_once('\n') {
        Some((first, rest)) => (first.trim(), rest),
        None => (segment.trim(), ""),
    };

    match name_from_line(first) {
        Some(name) => BatchWorkItem {
            display_name: name,
            post_body: rest.trim().to_string(),
        },
        None => BatchWorkItem {
            display_name: format!("Response {}", index + 1),
            post_body: segment.to_string(),
        },
    }
}

fn name_from_line(line: &str) -> Option<String> {
    let looks_like_name = !line.is_empty()
        && line.chars().count() < MAX_NAME_CHARS
        && !line.contains(['.', '?']);
    if !looks_like_name {
        return None;
    }
    let name = line.trim_end_matches([',', ':']).trim();
    (!name.is_empty()).then(|| name.to_string())
}
