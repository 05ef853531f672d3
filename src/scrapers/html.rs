//! Small helpers over `scraper` for the HTML extractors.

use scraper::{ElementRef, Selector};
use serde_json::Value;

use super::RawRecord;

/// Compile a selector literal. Only used for static selectors.
pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e}"))
}

/// First descendant matching a selector.
pub(crate) fn first<'a>(el: ElementRef<'a>, sel: &Selector) -> Option<ElementRef<'a>> {
    el.select(sel).next()
}

/// Direct element children with the given tag name.
pub(crate) fn children<'a>(el: ElementRef<'a>, tag: &'a str) -> impl Iterator<Item = ElementRef<'a>> {
    el.children()
        .filter_map(ElementRef::wrap)
        .filter(move |c| c.value().name() == tag)
}

/// Concatenated, trimmed text of an element and its descendants.
pub(crate) fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Trimmed text nodes directly under an element, skipping blank ones.
pub(crate) fn own_text(el: ElementRef<'_>) -> Vec<String> {
    el.children()
        .filter_map(|node| node.value().as_text().map(|t| t.trim().to_string()))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Trimmed attribute value, absent when empty.
pub(crate) fn attr(el: ElementRef<'_>, name: &str) -> Option<String> {
    el.value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Whether the element's class attribute contains a class.
pub(crate) fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

/// Insert a string field if present.
pub(crate) fn put(record: &mut RawRecord, key: &str, value: Option<String>) {
    if let Some(v) = value {
        record.insert(key.to_string(), Value::String(v));
    }
}
