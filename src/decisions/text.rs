//! Helpers for the HTML fragments motion text arrives in.

use regex::Regex;
use std::sync::LazyLock;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p\b([^>]*)>(.*?)</p\s*>").unwrap());
static CLASS_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)class\s*=\s*["']([^"']*)["']"#).unwrap());

/// A `<p>` element reduced to its classes and plain text.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub classes: Vec<String>,
    pub text: String,
}

impl Paragraph {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// Strip tags and decode HTML entities, named or numeric.
pub fn text_only(html: &str) -> String {
    html_escape::decode_html_entities(&TAG.replace_all(html, "")).into_owned()
}

/// Every `<p>` in document order.
pub fn paragraphs(html: &str) -> Vec<Paragraph> {
    PARAGRAPH
        .captures_iter(html)
        .map(|cap| {
            let attrs = cap.get(1).map_or("", |m| m.as_str());
            let classes = CLASS_ATTR
                .captures(attrs)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().split_whitespace().map(str::to_string).collect())
                .unwrap_or_default();
            Paragraph {
                classes,
                text: text_only(cap.get(2).map_or("", |m| m.as_str())),
            }
        })
        .collect()
}

/// Join the text of every paragraph containing any trigger (case-sensitive).
pub fn item_in_isolation(html: &str, triggers: &[&str]) -> String {
    paragraphs(html)
        .into_iter()
        .filter(|p| triggers.iter().any(|t| p.text.contains(t)))
        .map(|p| p.text)
        .collect::<Vec<_>>()
        .join(" ")
}
