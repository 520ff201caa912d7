//! Qualitative tags attached to an evaluation.

use panelist_state::{Polarity, Tag};

/// Suggested positive tags.
pub const POSITIVE_TAGS: &[&str] = &[
    "logical",
    "confident",
    "well prepared",
    "collaborative",
    "strong ideas",
    "understands the role",
    "listens well",
    "concrete examples",
    "growth mindset",
];

/// Suggested negative tags.
pub const NEGATIVE_TAGS: &[&str] = &[
    "passive",
    "off-topic answers",
    "weak reasoning",
    "quiet voice",
    "nervous",
    "collaboration concerns",
    "defensive",
];

/// Remove the tag whose text matches `text` (whatever its polarity),
/// otherwise append it with `polarity`. Returns `true` when the tag was added.
pub fn toggle_tag(tags: &mut Vec<Tag>, text: &str, polarity: Polarity) -> bool {
    if let Some(index) = tags.iter().position(|t| t.text == text) {
        tags.remove(index);
        return false;
    }
    tags.push(Tag {
        text: text.to_string(),
        polarity,
    });
    true
}

/// Parse the `+text` / `-text` shorthand. Bare text counts as positive.
pub fn parse_tag(input: &str) -> Option<Tag> {
    let input = input.trim();
    let (polarity, text) = match input.strip_prefix('-') {
        Some(rest) => (Polarity::Negative, rest),
        None => (Polarity::Positive, input.strip_prefix('+').unwrap_or(input)),
    };
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(Tag {
        text: text.to_string(),
        polarity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_twice_restores_tags() {
        let original = vec![Tag::positive("confident")];
        let mut tags = original.clone();

        assert!(toggle_tag(&mut tags, "nervous", Polarity::Negative));
        assert!(!toggle_tag(&mut tags, "nervous", Polarity::Negative));
        assert_eq!(tags, original);
    }

    #[test]
    fn test_toggle_removes_regardless_of_polarity() {
        let mut tags = vec![Tag::positive("confident")];
        assert!(!toggle_tag(&mut tags, "confident", Polarity::Negative));
        assert!(tags.is_empty());
    }

    #[test]
    fn test_parse_tag_shorthand() {
        assert_eq!(parse_tag("+logical"), Some(Tag::positive("logical")));
        assert_eq!(parse_tag("-quiet voice"), Some(Tag::negative("quiet voice")));
        assert_eq!(parse_tag("curious"), Some(Tag::positive("curious")));
        assert_eq!(parse_tag(" - "), None);
    }

    #[test]
    fn test_palettes_do_not_overlap() {
        assert!(POSITIVE_TAGS.iter().all(|t| !NEGATIVE_TAGS.contains(t)));
    }
}
