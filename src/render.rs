use std::path::{Path, PathBuf};

use serde::Serialize;
use tera::{Context, Tera};

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("templates directory not found: {0}")]
    TemplatesNotFound(String),

    #[error("template '{0}' not found")]
    TemplateNotFound(String),
}

/// The template renderer, wrapping Tera.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Create a new renderer loading every template under `templates_path`.
    pub fn new(templates_path: &Path) -> Result<Self, RenderError> {
        if !templates_path.is_dir() {
            return Err(RenderError::TemplatesNotFound(
                templates_path.display().to_string(),
            ));
        }

        let glob = templates_path.join("**/*");
        let glob_str = glob.to_string_lossy();
        let mut tera = Tera::new(&glob_str)?;
        // Documents are rendered into all kinds of formats, not only HTML.
        tera.autoescape_on(vec![]);

        Ok(Self { tera })
    }

    /// Create a renderer from several template directories.
    ///
    /// A template found in more than one directory is taken from the first
    /// of them, so earlier directories override later ones. Directories that
    /// do not exist are skipped; at least one must exist.
    pub fn from_dirs(templates_paths: &[PathBuf]) -> Result<Self, RenderError> {
        let mut loaded = templates_paths
            .iter()
            .filter(|path| path.is_dir())
            .map(|path| Self::new(path));

        let Some(first) = loaded.next() else {
            let searched = templates_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(RenderError::TemplatesNotFound(searched));
        };

        let mut renderer = first?;
        for fallback in loaded {
            // `extend` keeps templates already present.
            renderer.tera.extend(&fallback?.tera)?;
        }
        Ok(renderer)
    }

    /// Create a renderer from in-memory templates.
    pub fn from_templates<'t>(
        templates: impl IntoIterator<Item = (&'t str, &'t str)>,
    ) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_templates(templates)?;
        Ok(Self { tera })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|t| t == name)
    }

    /// Render the named template with the given context.
    pub fn render(&self, name: &str, context: &ItemContext) -> Result<String, RenderError> {
        if !self.has_template(name) {
            return Err(RenderError::TemplateNotFound(name.to_string()));
        }

        let mut tera_context = Context::from_value(context.extra.clone())?;
        tera_context.insert("item", &context.item);
        tera_context.insert("metadata", &context.metadata);

        Ok(self.tera.render(name, &tera_context)?)
    }
}

/// Context passed to item templates.
///
/// `extra` must be a JSON object; its keys land at the top level next to
/// `item` and `metadata`, which take precedence on collisions.
#[derive(Debug, Serialize)]
pub struct ItemContext {
    /// All attributes of the document being rendered
    pub item: serde_json::Value,
    /// Site-wide metadata
    pub metadata: serde_json::Value,
    /// Extra top-level variables from the stage configuration
    pub extra: serde_json::Value,
}
