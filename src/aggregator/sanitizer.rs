//! Strips structural markdown noise from user-authored text before summarization.
//!
//! Every pattern is line-anchored and removes the match together with its own
//! line terminator (`\n` or `\r\n`), or up to the end of input. Blank lines
//! directly above a checklist item count as part of that item. Everything else
//! is left byte-for-byte unchanged.

use regex::Regex;
use std::sync::LazyLock;

// Leading `\s*` may span blank lines.
static CHECKLIST_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*- \[[x ]\][^\r\n]+(?:\r?\n|$)").expect("invalid checklist regex"));

static COMMENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)^<!--.*?-->(?:\r?\n|$)").expect("invalid comment regex"));

static CODE_BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)^```.*?```(?:\r?\n|$)").expect("invalid code block regex"));

/// Removes `- [ ]` / `- [x]` checklist lines.
pub fn remove_checklists(text: &str) -> String {
    CHECKLIST_REGEX.replace_all(text, "").into_owned()
}

/// Removes `<!-- ... -->` comments that start at the beginning of a line.
pub fn remove_comments(text: &str) -> String {
    COMMENT_REGEX.replace_all(text, "").into_owned()
}

/// Removes fenced code blocks. Not part of [`sanitize`].
pub fn remove_code_blocks(text: &str) -> String {
    CODE_BLOCK_REGEX.replace_all(text, "").into_owned()
}

/// Cleans an item body for summarization: checklists first, then comments.
pub fn sanitize(text: &str) -> String {
    remove_comments(&remove_checklists(text))
}
