//! Ignore-marker matching.
//!
//! An element opts out of rules with an attribute (by default
//! `data-layoutlint-ignore`) holding a whitespace- or comma-separated token
//! list. The marker is inherited: it applies to every descendant.

use crate::snapshot::{ElementNode, LayoutSnapshot};

/// Default ignore-marker attribute
pub const DEFAULT_IGNORE_ATTRIBUTE: &str = "data-layoutlint-ignore";

/// Rule id without its plugin namespace (`acme/foo` → `foo`)
#[must_use]
pub fn bare_rule_id(rule_id: &str) -> &str {
    rule_id.rsplit('/').next().unwrap_or(rule_id)
}

/// Whether a marker value silences `rule_id`: an empty list, `all`, `*`,
/// or the bare rule id
#[must_use]
pub fn marker_matches(value: &str, rule_id: &str) -> bool {
    let bare = bare_rule_id(rule_id);
    let mut tokens = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .peekable();
    if tokens.peek().is_none() {
        return true;
    }
    tokens.any(|t| t == "all" || t == "*" || t == bare)
}

/// Whether `el` or an ancestor carries a marker matching `rule_id`
#[must_use]
pub fn is_ignored(
    snapshot: &LayoutSnapshot,
    el: &ElementNode,
    rule_id: &str,
    attribute: &str,
) -> bool {
    std::iter::once(el)
        .chain(snapshot.ancestors(el))
        .filter_map(|n| n.attr(attribute))
        .any(|v| marker_matches(v, rule_id))
}
