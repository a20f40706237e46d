//! Configuration type definitions.
//!
//! ```yaml
//! metadata:
//!   url: https://example.com
//!   title: My Site
//!
//! pipes:
//!   compile:
//!     - name: source
//!       args: { path: content }
//!     - name: prettyuri
//!     - name: sitemap
//!       args: { gzip: true }
//!     - name: save
//!       args: { to: _site }
//!
//! # Optional: how deeply `pipe` stages may nest (default 16)
//! max_depth: 8
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ConfigError;
use crate::pipeline::{DEFAULT_MAX_DEPTH, StageDescriptor};

/// Project configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Site-wide metadata, read-only to every stage. `url` is the base URL
    /// absolute document URLs are built from.
    #[serde(default)]
    pub metadata: Map<String, Value>,

    /// Named pipelines.
    pub pipes: BTreeMap<String, Vec<StageDescriptor>>,

    /// How many levels deep `pipe` stages may nest.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Config {
    /// Look up a named pipeline.
    pub fn pipe(&self, name: &str) -> Result<&[StageDescriptor], ConfigError> {
        self.pipes.get(name).map(Vec::as_slice).ok_or_else(|| {
            ConfigError::PipeNotFound(
                name.to_string(),
                self.pipes.keys().cloned().collect::<Vec<_>>().join(", "),
            )
        })
    }

    /// Base URL of the site, if configured.
    pub fn site_url(&self) -> Option<&str> {
        self.metadata.get("url").and_then(Value::as_str)
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.pipes.is_empty() {
            return Err(ConfigError::Validation(
                "'pipes' must define at least one pipeline\n\nExample:\n  pipes:\n    compile:\n      - name: source\n      - name: save".to_string(),
            ));
        }

        match self.metadata.get("url") {
            None => {}
            Some(Value::String(url)) if url.starts_with("http://") || url.starts_with("https://") => {}
            Some(other) => {
                return Err(ConfigError::Validation(format!(
                    "'metadata.url' must be an absolute http(s) URL, got {other}"
                )));
            }
        }

        Ok(())
    }
}
