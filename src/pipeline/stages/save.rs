//! File writing stage.
//!
//! Writes documents to the output directory.

use serde::Deserialize;
use tracing::info;

use crate::paths::destination_to_output_path;
use crate::pipeline::{
    DocumentStream, ParamKind, Params, PipelineError, ProcessContext, Result, Schema, Selector,
    Stage, transform_selected,
};

const STAGE: &str = "save";

/// Stage that writes selected documents under the output directory.
///
/// Each document is written to `<to>/<destination>`, creating any missing
/// parent directories, and is then passed on unchanged so later stages
/// (or another `save`) still see it. Writes happen as documents are pulled,
/// one at a time.
pub struct SaveStage;

#[derive(Deserialize)]
struct SaveParams {
    when: Selector,
    to: String,
}

impl Stage for SaveStage {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .selector()
            .optional("to", ParamKind::String, "_site")
    }

    fn process<'a>(
        &self,
        ctx: ProcessContext<'a>,
        stream: DocumentStream<'a>,
        params: Params,
    ) -> Result<DocumentStream<'a>> {
        let params: SaveParams = params.decode()?;
        let output_dir = ctx.resolve_path(&params.to);

        Ok(transform_selected(stream, params.when, move |doc| {
            let output_path = destination_to_output_path(&doc.destination, &output_dir);

            if let Some(parent) = output_path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| PipelineError::io(STAGE, parent, e))?;
            }
            std::fs::write(&output_path, doc.content.as_bytes())
                .map_err(|e| PipelineError::io(STAGE, &output_path, e))?;

            info!(path = %output_path.display(), "saved document");
            Ok(doc)
        }))
    }
}
