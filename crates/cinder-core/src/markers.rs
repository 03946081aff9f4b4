//! Reserved names shared by the precompiler, the binder and the host tree.

/// Sentinel that brackets an argument index inside concatenated markup.
/// Literal skeleton text must never contain it.
pub const SENTINEL: char = '\u{FFFE}';

/// Element name substituted for a dynamic tag (`<${Component}>`).
pub const PLACEHOLDER_TAG: &str = "cinder-node";

/// Attribute carrying the argument index of a dynamic tag.
pub const ARG_ATTR: &str = "data-cinder-arg";

/// Element standing in for an inline content slot until it is bound.
pub const CONTENT_TAG: &str = "cinder-slot";

/// Attribute carrying the slot id of every node that owns bindings.
pub const SLOT_ATTR: &str = "data-cinder-slot";

/// Text of the comment inserted when a component renders nothing.
pub const WHITEOUT: &str = "cinder whiteout";

pub const HANDLER_PREFIX: &str = "on";
pub const CHILDREN: &str = "children";
pub const INNER_MARKUP: &str = "dangerously-set-inner-html";
pub const INNER_MARKUP_KEY: &str = "__html";
pub const VALUE: &str = "value";

/// Shorthand end tag closing the nearest dynamically named element.
pub(crate) const SHORTHAND_CLOSE: &str = "</>";

pub(crate) fn placeholder_close() -> String {
    format!("</{PLACEHOLDER_TAG} {SENTINEL}>")
}

pub(crate) fn content_marker(index: usize) -> String {
    format!("{SENTINEL}{index}{SENTINEL}")
}

/// Parses `\u{FFFE}<digits>\u{FFFE}` occupying the whole input.
pub(crate) fn parse_whole_marker(text: &str) -> Option<usize> {
    let inner = text.strip_prefix(SENTINEL)?.strip_suffix(SENTINEL)?;
    if inner.is_empty() || !inner.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    inner.parse().ok()
}

pub fn is_handler_name(name: &str) -> bool {
    name.starts_with(HANDLER_PREFIX)
}
