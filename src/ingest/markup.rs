//! Best-effort plain-text extraction from HTML.
//!
//! This is deliberately not a DOM parser. Script and style blocks are removed
//! with their content, every remaining tag is replaced by a space, the five
//! common named entities plus `&#39;` are decoded, and whitespace runs are
//! collapsed. Structure is not preserved. Malformed markup never fails; at
//! worst some tag residue survives.

use std::sync::LazyLock;

use regex::Regex;

static RE_SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b.*?</script>").expect("static regex must parse"));

static RE_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b.*?</style>").expect("static regex must parse"));

static RE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("static regex must parse"));

static RE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex must parse"));

/// Entity replacements, applied in order. `&amp;` precedes `&lt;`, so
/// `&amp;lt;` decodes all the way to `<`.
const ENTITIES: [(&str, &str); 6] = [
    ("&nbsp;", " "),
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
];

/// Strip markup down to a single line of plain text.
pub fn strip_markup(html: &str) -> String {
    let text = RE_SCRIPT.replace_all(html, "");
    let text = RE_STYLE.replace_all(&text, "");
    let mut text = RE_TAG.replace_all(&text, " ").into_owned();

    for (entity, replacement) in ENTITIES {
        if text.contains(entity) {
            text = text.replace(entity, replacement);
        }
    }

    RE_WHITESPACE.replace_all(&text, " ").trim().to_string()
}
