//! Document types for pipeline processing.

use serde_json::{Map, Value};

use crate::paths::{is_index_file, join_url};

/// Scheme prefix marking documents synthesized by a stage.
pub const VIRTUAL_SCHEME: &str = "virtual://";

/// The payload of a document.
///
/// Sources produce `Text` for UTF-8 files and `Bytes` for everything else;
/// stages producing binary output (e.g. a gzipped sitemap) also use `Bytes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Bytes(Vec<u8>),
}

impl Content {
    /// The text payload, if this is textual content.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(text) => Some(text),
            Content::Bytes(_) => None,
        }
    }

    /// The payload as raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Content::Text(text) => text.as_bytes(),
            Content::Bytes(bytes) => bytes,
        }
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Content {
    fn from(bytes: Vec<u8>) -> Self {
        Content::Bytes(bytes)
    }
}

/// A content item flowing through the pipeline.
///
/// The three required attributes are fields; everything else set by
/// upstream stages (template name, `updated` timestamp, title, ...) lives in
/// the metadata map. The origin (`source`) is fixed at construction, while
/// `destination`, `content` and metadata values may be changed in place by
/// whichever stage currently owns the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    source: String,
    /// Output path relative to the output directory, `/`-separated.
    pub destination: String,
    pub content: Content,
    metadata: Map<String, Value>,
}

impl Document {
    /// Create a document read from some external origin.
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        content: impl Into<Content>,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            content: content.into(),
            metadata: Map::new(),
        }
    }

    /// Create a document synthesized by `stage`, with no external origin.
    pub fn synthesized(
        stage: &str,
        destination: impl Into<String>,
        content: impl Into<Content>,
    ) -> Self {
        Self::new(format!("{VIRTUAL_SCHEME}{stage}"), destination, content)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether this document was synthesized by a stage.
    pub fn is_virtual(&self) -> bool {
        self.source.starts_with(VIRTUAL_SCHEME)
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Look up an attribute by name.
    ///
    /// `source`, `destination` and textual `content` resolve to string
    /// values; any other key is looked up in the metadata. Missing keys yield
    /// `None` (binary content is treated as missing).
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "source" => Some(Value::String(self.source.clone())),
            "destination" => Some(Value::String(self.destination.clone())),
            "content" => self.content.as_text().map(|t| Value::String(t.to_string())),
            _ => self.metadata.get(key).cloned(),
        }
    }

    /// Look up an attribute, falling back to `default` when missing.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    /// Compare an attribute against an expected value without cloning.
    pub fn attribute_equals(&self, key: &str, expected: &Value) -> bool {
        match key {
            "source" => expected.as_str() == Some(self.source.as_str()),
            "destination" => expected.as_str() == Some(self.destination.as_str()),
            "content" => match self.content.as_text() {
                Some(text) => expected.as_str() == Some(text),
                None => false,
            },
            _ => self.metadata.get(key) == Some(expected),
        }
    }

    /// Set a metadata value.
    ///
    /// The required attributes are fields and cannot be set through here;
    /// `source` is immutable and the others have typed setters.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        debug_assert!(
            !matches!(key.as_str(), "source" | "destination" | "content"),
            "required attribute '{key}' set through metadata"
        );
        self.metadata.insert(key, value.into());
    }

    /// Get a metadata value as a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// The site-relative URL this document is served at.
    ///
    /// Index files are served as their directory:
    /// `blog/index.html` -> `/blog/`, `about.html` -> `/about.html`.
    pub fn url(&self) -> String {
        let destination = self.destination.trim_start_matches('/');
        match destination.rsplit_once('/') {
            Some((dir, name)) if is_index_file(name) => format!("/{dir}/"),
            None if is_index_file(destination) => "/".to_string(),
            _ => format!("/{destination}"),
        }
    }

    /// The absolute URL of this document under the given site base URL.
    pub fn absolute_url(&self, base_url: &str) -> String {
        join_url(base_url, &self.url())
    }

    /// All attributes as a JSON object, for template contexts.
    pub fn to_value(&self) -> Value {
        let mut object = self.metadata.clone();
        object.insert("source".into(), Value::String(self.source.clone()));
        object.insert(
            "destination".into(),
            Value::String(self.destination.clone()),
        );
        if let Some(text) = self.content.as_text() {
            object.insert("content".into(), Value::String(text.to_string()));
        }
        object.insert("url".into(), Value::String(self.url()));
        Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_required_attributes() {
        let doc = Document::new("content/a.md", "a.html", "hello");
        assert_eq!(doc.get("source"), Some(json!("content/a.md")));
        assert_eq!(doc.get("destination"), Some(json!("a.html")));
        assert_eq!(doc.get("content"), Some(json!("hello")));
        assert_eq!(doc.get("missing"), None);
        assert_eq!(doc.get_or("missing", json!(false)), json!(false));
    }

    #[test]
    fn test_binary_content_is_not_an_attribute() {
        let doc = Document::new("logo.png", "logo.png", vec![0xffu8, 0xd8]);
        assert_eq!(doc.get("content"), None);
        assert!(!doc.attribute_equals("content", &json!("")));
    }

    #[test]
    fn test_metadata_roundtrip() {
        let mut doc = Document::new("a.md", "a.html", "");
        doc.set("template", "post.html");
        doc.set("tags", json!(["rust", "web"]));
        assert_eq!(doc.get_str("template"), Some("post.html"));
        assert!(doc.attribute_equals("tags", &json!(["rust", "web"])));
        assert!(!doc.attribute_equals("tags", &json!(["web", "rust"])));
    }

    #[test]
    fn test_synthesized_document_is_virtual() {
        let doc = Document::synthesized("sitemap", "sitemap.xml", "");
        assert_eq!(doc.source(), "virtual://sitemap");
        assert!(doc.is_virtual());
        assert!(!Document::new("a.md", "a.html", "").is_virtual());
    }

    #[test]
    fn test_url() {
        assert_eq!(Document::new("", "about.html", "").url(), "/about.html");
        assert_eq!(Document::new("", "blog/index.html", "").url(), "/blog/");
        assert_eq!(Document::new("", "index.htm", "").url(), "/");
        assert_eq!(Document::new("", "a/b/c.xml", "").url(), "/a/b/c.xml");
    }

    #[test]
    fn test_absolute_url() {
        let doc = Document::new("", "about/index.html", "");
        assert_eq!(doc.absolute_url("https://x"), "https://x/about/");
        assert_eq!(doc.absolute_url("https://x/"), "https://x/about/");
        assert_eq!(doc.absolute_url(""), "/about/");
    }
}
