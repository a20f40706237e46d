//! Source stage: reads files from a directory into documents.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::paths::relative_path_to_destination;
use crate::pipeline::{
    Content, Document, DocumentStream, ParamKind, Params, PipelineError, ProcessContext, Result,
    Schema, Stage,
};

const STAGE: &str = "source";

/// Stage that appends a document for every file under a directory.
///
/// The input stream is passed through first; then each file becomes a
/// document whose `destination` is its path relative to `path`, whose
/// `content` is its text (or raw bytes when it is not UTF-8), and whose
/// `updated` metadata is its modification time. Hidden files and
/// directories are skipped. With `pattern`, only files whose relative path
/// matches the regular expression are read.
///
/// The directory listing is taken when the first file is pulled and holds
/// paths only; file contents are read one at a time as they are pulled.
pub struct SourceStage;

#[derive(Deserialize)]
struct SourceParams {
    path: String,
    pattern: Option<String>,
}

impl Stage for SourceStage {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .optional("path", ParamKind::String, ".")
            .optional("pattern", ParamKind::OptionalString, Value::Null)
    }

    fn process<'a>(
        &self,
        ctx: ProcessContext<'a>,
        stream: DocumentStream<'a>,
        params: Params,
    ) -> Result<DocumentStream<'a>> {
        let params: SourceParams = params.decode()?;

        let root = ctx.resolve_path(&params.path);
        if !root.is_dir() {
            return Err(PipelineError::configuration(
                STAGE,
                "path",
                format!("{} is not a directory", root.display()),
            ));
        }

        let pattern = params
            .pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| PipelineError::configuration(STAGE, "pattern", e.to_string()))?;

        Ok(Box::new(stream.chain(read_files(root, PathBuf::new(), pattern))))
    }
}

/// Lazily read every (matching) file under `root.join(start)`.
///
/// Destinations stay relative to `root`, so starting at `static` yields
/// destinations like `static/site.css`.
pub(super) fn read_files(
    root: PathBuf,
    start: PathBuf,
    pattern: Option<Regex>,
) -> impl Iterator<Item = Result<Document>> {
    let mut listing: Option<std::vec::IntoIter<PathBuf>> = None;

    std::iter::from_fn(move || {
        if listing.is_none() {
            let mut files = Vec::new();
            if let Err(e) = walk_directory(&root, &start, &mut files) {
                listing = Some(Vec::new().into_iter());
                return Some(Err(e));
            }
            files.retain(|relative| match &pattern {
                Some(pattern) => pattern.is_match(&relative_path_to_destination(relative)),
                None => true,
            });
            debug!(root = %root.display(), files = files.len(), "listed source files");
            listing = Some(files.into_iter());
        }

        let relative = listing.as_mut()?.next()?;
        Some(read_document(&root, &relative))
    })
}

/// Recursively collect file paths relative to `root`, sorted by name.
fn walk_directory(root: &Path, relative_path: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let dir = root.join(relative_path);
    let entries = std::fs::read_dir(&dir).map_err(|e| PipelineError::io(STAGE, &dir, e))?;

    let mut entries = entries
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| PipelineError::io(STAGE, &dir, e))?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let file_name = entry.file_name();

        // Skip hidden files and directories
        if file_name.to_string_lossy().starts_with('.') {
            continue;
        }

        let path = entry.path();
        let item_relative_path = relative_path.join(&file_name);

        if path.is_dir() {
            walk_directory(root, &item_relative_path, files)?;
        } else if path.is_file() {
            files.push(item_relative_path);
        }
    }

    Ok(())
}

fn read_document(root: &Path, relative: &Path) -> Result<Document> {
    let path = root.join(relative);
    let bytes = std::fs::read(&path).map_err(|e| PipelineError::io(STAGE, &path, e))?;
    let modified = std::fs::metadata(&path)
        .and_then(|m| m.modified())
        .map_err(|e| PipelineError::io(STAGE, &path, e))?;

    let content = match String::from_utf8(bytes) {
        Ok(text) => Content::Text(text),
        Err(e) => Content::Bytes(e.into_bytes()),
    };

    let mut doc = Document::new(
        path.to_string_lossy(),
        relative_path_to_destination(relative),
        content,
    );
    doc.set("updated", DateTime::<Utc>::from(modified).to_rfc3339());
    Ok(doc)
}
