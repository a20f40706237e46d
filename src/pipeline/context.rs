//! Process context shared by every stage of a run.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::{DocumentStream, Invoker, Result, StageDescriptor};

/// Read-only state available to every stage during a pipeline run.
///
/// Holds the site metadata (e.g. `url`, `title`), the directory relative
/// paths are resolved against, and the invoker the run was started from so
/// stages like `pipe` can run nested pipelines. The context is `Copy`; a
/// stage captures it by value into the stream it returns.
#[derive(Clone, Copy)]
pub struct ProcessContext<'a> {
    invoker: &'a Invoker,
    metadata: &'a Map<String, Value>,
    base_path: &'a Path,
    /// How many `pipe` levels deep this context is
    depth: usize,
}

impl<'a> ProcessContext<'a> {
    /// Create a top-level context.
    pub fn new(invoker: &'a Invoker, metadata: &'a Map<String, Value>, base_path: &'a Path) -> Self {
        Self {
            invoker,
            metadata,
            base_path,
            depth: 0,
        }
    }

    /// Site-wide metadata.
    pub fn metadata(&self) -> &'a Map<String, Value> {
        self.metadata
    }

    /// The site base URL (metadata key `url`), or `""` if unset.
    pub fn base_url(&self) -> &'a str {
        self.metadata
            .get("url")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Resolve a configured path against the project directory.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_relative() {
            self.base_path.join(path)
        } else {
            path.to_path_buf()
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Run a nested pipeline one level deeper than this context.
    pub fn invoke(
        &self,
        descriptors: &[StageDescriptor],
        stream: DocumentStream<'a>,
    ) -> Result<DocumentStream<'a>> {
        let nested = Self {
            depth: self.depth + 1,
            ..*self
        };
        self.invoker.invoke(nested, descriptors, stream)
    }
}

impl std::fmt::Debug for ProcessContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessContext")
            .field("metadata", &self.metadata)
            .field("base_path", &self.base_path)
            .field("depth", &self.depth)
            .finish()
    }
}
