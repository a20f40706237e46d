//! Template rendering stage.
//!
//! Renders document content through Tera templates, the way a theme wraps
//! page content in the site chrome.

use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::source::read_files;
use crate::pipeline::{
    Content, DocumentStream, ParamKind, Params, PipelineError, ProcessContext, Result, Schema,
    Selector, Stage, transform_selected,
};
use crate::render::{ItemContext, Renderer};

const STAGE: &str = "render";

/// Stage that replaces selected documents' content with a rendered template.
///
/// Each document is rendered with the template named by its own `template`
/// attribute, falling back to the stage's `template` parameter. Templates
/// see:
/// - `item`: every attribute of the document (including the current
///   `content` and its `url`)
/// - `metadata`: the site metadata
/// - each key of the stage's `context` parameter, at the top level
///
/// ```yaml
/// - name: render
///   args:
///     themes: [my-theme, vendor/base-theme]
/// ```
///
/// Templates are looked up in each theme's `templates/` directory in the
/// order the themes are listed, so a theme can override templates of the
/// themes after it. They are loaded when the pipeline is built, so a
/// missing theme or a syntax error fails the build before any document is
/// processed. Binary documents are passed through as is.
///
/// After the rendered documents, the files under each theme's `static/`
/// directory (stylesheets, images) are appended to the stream, theme by
/// theme, with destinations like `static/site.css`.
///
/// Streams one document at a time.
pub struct RenderStage;

#[derive(Deserialize)]
struct RenderParams {
    when: Selector,
    template: String,
    context: Map<String, Value>,
    themes: Vec<String>,
}

impl Stage for RenderStage {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .selector()
            .optional("template", ParamKind::String, "item.html")
            .optional("context", ParamKind::Object, Map::new())
            .optional("themes", ParamKind::StringList, json!(["."]))
    }

    fn process<'a>(
        &self,
        ctx: ProcessContext<'a>,
        stream: DocumentStream<'a>,
        params: Params,
    ) -> Result<DocumentStream<'a>> {
        let params: RenderParams = params.decode()?;

        let themes = params
            .themes
            .iter()
            .map(|theme| ctx.resolve_path(theme))
            .collect::<Vec<_>>();
        if let Some(missing) = themes.iter().find(|theme| !theme.is_dir()) {
            return Err(PipelineError::configuration(
                STAGE,
                "themes",
                format!("{} is not a directory", missing.display()),
            ));
        }

        let templates_paths = themes
            .iter()
            .map(|theme| theme.join("templates"))
            .collect::<Vec<_>>();
        let renderer = Renderer::from_dirs(&templates_paths)
            .map_err(|e| PipelineError::configuration(STAGE, "themes", e.to_string()))?;

        let metadata = Value::Object(ctx.metadata().clone());
        let extra = Value::Object(params.context);
        let default_template = params.template;

        let rendered = transform_selected(stream, params.when, move |mut doc| {
            if doc.content.as_text().is_none() {
                return Ok(doc);
            }

            let template = doc
                .get_str("template")
                .unwrap_or(default_template.as_str())
                .to_string();
            let context = ItemContext {
                item: doc.to_value(),
                metadata: metadata.clone(),
                extra: extra.clone(),
            };

            let rendered = renderer
                .render(&template, &context)
                .map_err(|source| PipelineError::Render {
                    stage: STAGE.to_string(),
                    template: template.clone(),
                    document: doc.source().to_string(),
                    source,
                })?;
            doc.content = Content::Text(rendered);
            Ok(doc)
        });

        let statics = themes
            .into_iter()
            .filter(|theme| theme.join("static").is_dir())
            .flat_map(|theme| read_files(theme, PathBuf::from("static"), None));

        Ok(Box::new(rendered.chain(statics)))
    }
}
