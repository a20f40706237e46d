//! Pipeline error types.

use std::path::PathBuf;

use crate::render::RenderError;

/// Errors that can occur while building or draining a pipeline.
///
/// None of these are recovered from: the first one aborts the whole
/// invocation and is surfaced to the caller.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// Invalid, unknown, or missing stage parameters, detected before the
    /// stage consumes any input.
    #[error("stage '{stage}': invalid parameter '{key}': {message}")]
    Configuration {
        stage: String,
        key: String,
        message: String,
    },

    /// A stage-specific invariant was broken at run time.
    #[error("stage '{stage}' failed: {message}")]
    ConstraintViolation { stage: String, message: String },

    /// An error raised upstream while `stage` was draining its input.
    #[error("stage '{stage}' could not materialize its input: {source}")]
    Upstream {
        stage: String,
        #[source]
        source: Box<PipelineError>,
    },

    #[error("stage '{stage}': failed to render '{document}' with '{template}': {source}")]
    Render {
        stage: String,
        template: String,
        document: String,
        #[source]
        source: RenderError,
    },

    #[error("stage '{stage}': failed to access {}: {source}", .path.display())]
    Io {
        stage: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Create a configuration error for a stage parameter.
    pub fn configuration(
        stage: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Configuration {
            stage: stage.into(),
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a run-time constraint violation.
    pub fn constraint(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Wrap an error pulled from upstream by a materializing stage.
    pub fn upstream(stage: impl Into<String>, source: PipelineError) -> Self {
        Self::Upstream {
            stage: stage.into(),
            source: Box::new(source),
        }
    }

    /// Create a filesystem error for a stage.
    pub fn io(stage: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            stage: stage.into(),
            path: path.into(),
            source,
        }
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
