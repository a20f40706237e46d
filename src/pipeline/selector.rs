//! Selector expressions (`when`) for picking the documents a stage acts on.
//!
//! A selector is either absent, which matches every document, or a list of
//! condition groups:
//!
//! ```yaml
//! when:
//!   - destination: index.html
//!   - template: post.html
//!     draft: false
//! ```
//!
//! A document matches when it satisfies at least one group, and satisfies a
//! group when every entry equals the document's attribute of that name.
//!
//! Equality is structural JSON equality for every value type: strings are
//! compared literally (`"blog/*"` is not a pattern), lists must be identical
//! including order, and mappings must be equal. A key the document does not
//! have never matches, not even `null`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Document, DocumentStream};

/// A single condition group: attribute name to expected value.
pub type ConditionGroup = Map<String, Value>;

/// A parsed `when` expression.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selector(Option<Vec<ConditionGroup>>);

impl Selector {
    /// A selector matching every document.
    pub fn all() -> Self {
        Self(None)
    }

    /// A selector matching documents that satisfy any of `groups`.
    pub fn any_of(groups: Vec<ConditionGroup>) -> Self {
        Self(Some(groups))
    }

    /// Whether a document satisfies this selector.
    pub fn matches(&self, doc: &Document) -> bool {
        match &self.0 {
            None => true,
            Some(groups) => groups.iter().any(|group| {
                group
                    .iter()
                    .all(|(key, expected)| doc.attribute_equals(key, expected))
            }),
        }
    }
}

/// Keep only the documents matching `selector`, preserving order.
///
/// Filtering is pull-based: each call to `next` pulls from `stream` only
/// until the next match. Errors are passed through so they reach the
/// consumer.
pub fn select<'a>(stream: DocumentStream<'a>, selector: Selector) -> DocumentStream<'a> {
    Box::new(stream.filter(move |item| match item {
        Ok(doc) => selector.matches(doc),
        Err(_) => true,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineError;
    use serde_json::json;
    use std::cell::Cell;

    fn doc(destination: &str) -> Document {
        Document::new(destination, destination, "")
    }

    fn selector(value: Value) -> Selector {
        serde_json::from_value(value).unwrap()
    }

    fn destinations(stream: DocumentStream) -> Vec<String> {
        stream.map(|d| d.unwrap().destination).collect()
    }

    #[test]
    fn test_absent_selector_matches_everything() {
        let docs: Vec<_> = ["a", "b", "c"].into_iter().map(doc).map(Ok).collect();
        let out = select(Box::new(docs.into_iter()), selector(Value::Null));
        assert_eq!(destinations(out), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_absent_selector_on_empty_stream() {
        let out = select(Box::new(std::iter::empty()), Selector::all());
        assert!(destinations(out).is_empty());
    }

    #[test]
    fn test_group_requires_every_entry() {
        let mut a = doc("a");
        a.set("template", "post.html");
        a.set("draft", false);
        let mut b = doc("b");
        b.set("template", "post.html");
        b.set("draft", true);

        let when = selector(json!([{"template": "post.html", "draft": false}]));
        assert!(when.matches(&a));
        assert!(!when.matches(&b));
    }

    #[test]
    fn test_any_group_suffices() {
        let when = selector(json!([{"destination": "a"}, {"destination": "c"}]));
        let docs: Vec<_> = ["a", "b", "c", "d"].into_iter().map(doc).map(Ok).collect();
        let out = select(Box::new(docs.into_iter()), when);
        assert_eq!(destinations(out), vec!["a", "c"]);
    }

    #[test]
    fn test_strings_are_not_patterns() {
        let when = selector(json!([{"destination": "blog/*"}]));
        assert!(!when.matches(&doc("blog/post.html")));
        assert!(when.matches(&doc("blog/*")));
    }

    #[test]
    fn test_list_values_require_identical_lists() {
        let mut d = doc("a");
        d.set("tags", json!(["rust", "web"]));

        assert!(selector(json!([{"tags": ["rust", "web"]}])).matches(&d));
        assert!(!selector(json!([{"tags": ["web", "rust"]}])).matches(&d));
        assert!(!selector(json!([{"tags": ["rust"]}])).matches(&d));
        assert!(!selector(json!([{"tags": "rust"}])).matches(&d));
    }

    #[test]
    fn test_nested_mappings_compare_structurally() {
        let mut d = doc("a");
        d.set("author", json!({"name": "Ann", "email": "ann@x"}));

        assert!(selector(json!([{"author": {"email": "ann@x", "name": "Ann"}}])).matches(&d));
        assert!(!selector(json!([{"author": {"name": "Ann"}}])).matches(&d));
    }

    #[test]
    fn test_missing_attribute_never_matches() {
        assert!(!selector(json!([{"draft": null}])).matches(&doc("a")));
    }

    #[test]
    fn test_empty_group_and_empty_list() {
        assert!(selector(json!([{}])).matches(&doc("a")));
        assert!(!selector(json!([])).matches(&doc("a")));
    }

    #[test]
    fn test_select_is_lazy() {
        let pulled = Cell::new(0);
        let source = (0..).map(|i| {
            pulled.set(pulled.get() + 1);
            Ok(doc(&i.to_string()))
        });
        let when = selector(json!([{"destination": "1"}, {"destination": "3"}]));
        let mut out = select(Box::new(source), when);

        assert_eq!(out.next().unwrap().unwrap().destination, "1");
        assert_eq!(pulled.get(), 2);
        assert_eq!(out.next().unwrap().unwrap().destination, "3");
        assert_eq!(pulled.get(), 4);
    }

    #[test]
    fn test_errors_pass_through() {
        let items = vec![
            Ok(doc("a")),
            Err(PipelineError::constraint("test", "boom")),
            Ok(doc("b")),
        ];
        let when = selector(json!([{"destination": "b"}]));
        let out: Vec<_> = select(Box::new(items.into_iter()), when).collect();
        assert_eq!(out.len(), 2);
        assert!(out[0].is_err());
        assert_eq!(out[1].as_ref().unwrap().destination, "b");
    }
}
