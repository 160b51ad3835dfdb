//! Map free-text model replies onto the canonical label set.
//!
//! Matching is deliberately simple: a case-insensitive exact pass, then a
//! containment pass in label order. Containment only counts when the shorter
//! string of the pair is longer than [`MIN_CONTAINMENT_CHARS`] characters.

/// The shorter side of a containment match must exceed this many characters.
pub const MIN_CONTAINMENT_CHARS: usize = 5;

/// Return the canonical label a reply maps to, if any.
///
/// Callers record [`crate::taxonomy::UNCATEGORIZED`] when this returns `None`.
pub fn match_label<'a>(raw_reply: &str, labels: &'a [String]) -> Option<&'a str> {
    let reply = raw_reply.trim().to_lowercase();
    if reply.is_empty() {
        return None;
    }

    if let Some(label) = labels.iter().find(|label| label.to_lowercase() == reply) {
        return Some(label.as_str());
    }

    labels
        .iter()
        .find(|label| contains_either_way(&reply, &label.to_lowercase()))
        .map(String::as_str)
}

/// Normalize a reply to a label or the uncategorized sentinel.
pub fn normalize<'a>(raw_reply: &str, labels: &'a [String]) -> &'a str {
    match match_label(raw_reply, labels) {
        Some(label) => label,
        None => crate::taxonomy::UNCATEGORIZED,
    }
}

fn contains_either_way(reply: &str, label: &str) -> bool {
    let reply_len = reply.chars().count();
    let label_len = label.chars().count();
    (label_len > MIN_CONTAINMENT_CHARS && reply.contains(label))
        || (reply_len > MIN_CONTAINMENT_CHARS && label.contains(reply))
}
