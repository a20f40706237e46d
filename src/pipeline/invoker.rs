//! The pipeline invoker: composes named stages into a chain.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::stages::{
    MetadataStage, PipeStage, PrettyUriStage, RenderStage, SaveStage, SitemapStage, SourceStage,
};
use super::{DocumentStream, PipelineError, ProcessContext, Result, Stage, schema};

/// Default bound on how deeply `pipe` stages may nest.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// One entry of a pipeline definition: which stage to run and its arguments.
///
/// ```yaml
/// - name: sitemap
///   args:
///     gzip: true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageDescriptor {
    pub name: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl StageDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Map::new(),
        }
    }

    /// Add an argument.
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }
}

/// Runs pipeline definitions against the stages it knows about.
///
/// The invoker threads a document stream through each stage in order. For
/// every descriptor it looks up the stage, validates the arguments against
/// the stage's schema, and only then calls the stage with the current
/// stream. Stages return lazy streams, so the whole chain (including nested
/// `pipe` stages) is validated and assembled before a single document is
/// pulled.
pub struct Invoker {
    stages: Vec<Box<dyn Stage>>,
    max_depth: usize,
}

impl Invoker {
    /// Create an invoker with no stages.
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Create an invoker with all built-in stages registered.
    pub fn with_default_stages() -> Self {
        let mut invoker = Self::new();
        invoker
            .add_stage(SourceStage)
            .add_stage(MetadataStage)
            .add_stage(PrettyUriStage)
            .add_stage(RenderStage)
            .add_stage(SitemapStage)
            .add_stage(PipeStage)
            .add_stage(SaveStage);
        invoker
    }

    /// Register a stage, replacing any stage with the same name.
    pub fn add_stage<S: Stage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.retain(|s| s.name() != stage.name());
        self.stages.push(Box::new(stage));
        self
    }

    /// Set how many levels deep `pipe` stages may nest.
    pub fn set_max_depth(&mut self, max_depth: usize) -> &mut Self {
        self.max_depth = max_depth;
        self
    }

    /// Get the names of all registered stages in registration order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    fn stage(&self, name: &str) -> Option<&dyn Stage> {
        self.stages
            .iter()
            .find(|s| s.name() == name)
            .map(|s| s.as_ref())
    }

    /// Thread `stream` through the stages named by `descriptors`.
    ///
    /// Any configuration error aborts before the stream is touched. Errors
    /// raised later while the returned stream is drained are yielded as
    /// `Err` items; consumers stop at the first one.
    pub fn invoke<'a>(
        &self,
        ctx: ProcessContext<'a>,
        descriptors: &[StageDescriptor],
        stream: DocumentStream<'a>,
    ) -> Result<DocumentStream<'a>> {
        if ctx.depth() > self.max_depth {
            return Err(PipelineError::configuration(
                "pipe",
                "pipe",
                format!(
                    "pipelines nested more than {} levels deep (is a pipe including itself?)",
                    self.max_depth
                ),
            ));
        }

        let mut stream = stream;
        for descriptor in descriptors {
            let stage = self.stage(&descriptor.name).ok_or_else(|| {
                PipelineError::configuration(
                    descriptor.name.as_str(),
                    "name",
                    format!(
                        "unknown stage (available: {})",
                        self.stage_names().join(", ")
                    ),
                )
            })?;

            let params = schema::validate(stage.name(), &descriptor.args, &stage.schema())?;

            debug!(stage = stage.name(), depth = ctx.depth(), "invoking stage");
            stream = stage.process(ctx, stream, params)?;
        }

        Ok(stream)
    }
}

impl Default for Invoker {
    fn default() -> Self {
        Self::with_default_stages()
    }
}
