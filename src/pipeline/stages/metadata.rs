//! Metadata stage.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::pipeline::{
    DocumentStream, ParamKind, Params, PipelineError, ProcessContext, Result, Schema, Selector,
    Stage, transform_selected,
};

/// Attributes stored as fields rather than metadata.
const RESERVED: [&str; 3] = ["source", "destination", "content"];

/// Stage that attaches metadata to selected documents.
///
/// ```yaml
/// - name: metadata
///   args:
///     when:
///       - template: post.html
///     metadata:
///       author: Ann
///     overwrite: false
/// ```
///
/// With `overwrite: false`, keys a document already has are left as they
/// are. Streams one document at a time.
pub struct MetadataStage;

#[derive(Deserialize)]
struct MetadataParams {
    when: Selector,
    metadata: Map<String, Value>,
    overwrite: bool,
}

impl Stage for MetadataStage {
    fn name(&self) -> &'static str {
        "metadata"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .selector()
            .optional("metadata", ParamKind::Object, Map::new())
            .optional("overwrite", ParamKind::Boolean, true)
    }

    fn process<'a>(
        &self,
        _ctx: ProcessContext<'a>,
        stream: DocumentStream<'a>,
        params: Params,
    ) -> Result<DocumentStream<'a>> {
        let params: MetadataParams = params.decode()?;

        if let Some(key) = params.metadata.keys().find(|k| RESERVED.contains(&k.as_str())) {
            return Err(PipelineError::configuration(
                self.name(),
                "metadata",
                format!("'{key}' is a document field and cannot be set as metadata"),
            ));
        }

        Ok(transform_selected(stream, params.when, move |mut doc| {
            for (key, value) in &params.metadata {
                if params.overwrite || !doc.metadata().contains_key(key) {
                    doc.set(key.clone(), value.clone());
                }
            }
            Ok(doc)
        }))
    }
}
