//! Nested pipeline stage.

use serde::Deserialize;

use crate::pipeline::{
    DocumentStream, ParamKind, Params, ProcessContext, Result, Schema, Stage, StageDescriptor,
};

/// Stage that runs its input through a nested pipeline.
///
/// ```yaml
/// - name: pipe
///   args:
///     pipe:
///       - name: prettyuri
///       - name: render
/// ```
///
/// Yields whatever the nested pipeline yields. Nested stages are validated
/// when the enclosing pipeline is built, and nesting is bounded by the
/// invoker's maximum depth. Buffers nothing itself.
pub struct PipeStage;

#[derive(Deserialize)]
struct PipeParams {
    pipe: Vec<StageDescriptor>,
}

impl Stage for PipeStage {
    fn name(&self) -> &'static str {
        "pipe"
    }

    fn schema(&self) -> Schema {
        Schema::new().optional("pipe", ParamKind::Pipeline, serde_json::json!([]))
    }

    fn process<'a>(
        &self,
        ctx: ProcessContext<'a>,
        stream: DocumentStream<'a>,
        params: Params,
    ) -> Result<DocumentStream<'a>> {
        let params: PipeParams = params.decode()?;
        ctx.invoke(&params.pipe, stream)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::test_support::{docs, run};
    use crate::pipeline::{Invoker, PipelineError, ProcessContext, StageDescriptor};

    fn pipe(nested: serde_json::Value) -> StageDescriptor {
        StageDescriptor::new("pipe").arg("pipe", nested)
    }

    #[test]
    fn test_pipe_matches_direct_invocation() {
        let input = docs(&["about/contact.html", "index.html", "blog/post.md"]);

        let direct = run(json!({}), &[StageDescriptor::new("prettyuri")], input.clone()).unwrap();
        let piped = run(json!({}), &[pipe(json!([{"name": "prettyuri"}]))], input).unwrap();

        assert_eq!(piped, direct);
    }

    #[test]
    fn test_empty_pipe_passes_through() {
        let input = docs(&["b", "a"]);
        let out = run(json!({}), &[StageDescriptor::new("pipe")], input.clone()).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_nested_pipes() {
        let input = docs(&["a.html"]);
        let nested = pipe(json!([{"name": "pipe", "args": {"pipe": [{"name": "prettyuri"}]}}]));
        let out = run(json!({}), &[nested], input).unwrap();
        assert_eq!(out[0].destination, "a/index.html");
    }

    #[test]
    fn test_nested_errors_surface_before_streaming() {
        let nested = pipe(json!([{"name": "sitemap", "args": {"gzip": "no"}}]));
        let err = run(json!({}), &[nested], docs(&["a"])).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Configuration { ref stage, ref key, .. } if stage == "sitemap" && key == "gzip"
        ));
    }

    #[test]
    fn test_malformed_descriptor_rejected() {
        let nested = pipe(json!([{"stage": "prettyuri"}]));
        assert!(matches!(
            run(json!({}), &[nested], docs(&["a"])),
            Err(PipelineError::Configuration { .. })
        ));
    }

    #[test]
    fn test_depth_is_bounded() {
        let mut invoker = Invoker::with_default_stages();
        invoker.set_max_depth(2);
        let metadata = serde_json::Map::new();
        let ctx = ProcessContext::new(&invoker, &metadata, std::path::Path::new("."));

        let nest = |levels: usize| {
            let mut pipeline = json!([]);
            for _ in 0..levels {
                pipeline = json!([{"name": "pipe", "args": {"pipe": pipeline}}]);
            }
            serde_json::from_value::<Vec<StageDescriptor>>(pipeline).unwrap()
        };

        let ok = invoker.invoke(ctx, &nest(2), Box::new(std::iter::empty()));
        assert!(ok.is_ok());

        let too_deep = invoker.invoke(ctx, &nest(3), Box::new(std::iter::empty()));
        assert!(matches!(
            too_deep,
            Err(PipelineError::Configuration { ref stage, .. }) if stage == "pipe"
        ));
    }
}
