//! Cell text sanitizer for storage-format fragments.
//!
//! Each pass is a function `&str -> String` applied in sequence. Structural
//! removal runs before generic tag stripping so nested macro markup cannot
//! leak partial text into the result.

use std::sync::LazyLock;

use regex::Regex;

/// Reduce a markup fragment to clean plain text.
///
/// Total over any input and idempotent on its own output.
pub fn sanitize_fragment(fragment: &str) -> String {
    let mut result = remove_task_lists(fragment);

    result = remove_link_blocks(&result);
    result = strip_tags(&result);
    result = replace_nbsp(&result);
    result = collapse_whitespace(&result);

    result
}

// ---------------------------------------------------------------------------
// Pass 1: Drop task lists
// ---------------------------------------------------------------------------

/// Remove `<ac:task-list>` blocks together with everything inside them.
fn remove_task_lists(text: &str) -> String {
    static TASK_LIST_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?is)<ac:task-list(?:\s[^>]*)?>.*?</ac:task-list\s*>").expect("valid regex")
    });

    TASK_LIST_RE.replace_all(text, "").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 2: Drop link macros
// ---------------------------------------------------------------------------

/// Remove `<ac:link>` blocks (page links, user mentions) with their bodies.
fn remove_link_blocks(text: &str) -> String {
    static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?is)<ac:link(?:\s[^>]*)?>.*?</ac:link\s*>").expect("valid regex")
    });

    LINK_RE.replace_all(text, "").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 3: Strip remaining tags
// ---------------------------------------------------------------------------

/// Remove every remaining tag-like marker, keeping the text between them.
fn strip_tags(text: &str) -> String {
    static TAG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

    TAG_RE.replace_all(text, "").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 4: Non-breaking spaces
// ---------------------------------------------------------------------------

fn replace_nbsp(text: &str) -> String {
    text.replace("&nbsp;", " ")
}

// ---------------------------------------------------------------------------
// Pass 5: Whitespace
// ---------------------------------------------------------------------------

/// Collapse whitespace runs to a single space and trim both ends.
fn collapse_whitespace(text: &str) -> String {
    static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

    WS_RE.replace_all(text, " ").trim().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
