//! Pipeline engine for document processing.
//!
//! A pipeline is an ordered list of stage descriptors. The [`Invoker`]
//! threads a lazy stream of [`Document`]s through the named stages:
//!
//! 1. Look up the stage by name
//! 2. Validate its arguments against the stage's [`Schema`]
//! 3. Call the stage with the current stream, getting a new lazy stream
//!
//! Streams are single-pass iterators pulled by the consumer. Most stages
//! transform one document at a time and buffer nothing; aggregating stages
//! (like the sitemap) drain their whole input the first time they are pulled.
//! Stages pick the documents they act on with a `when` [`Selector`].

mod context;
mod document;
mod error;
mod invoker;
pub mod schema;
mod selector;
pub mod stages;

pub use context::ProcessContext;
pub use document::{Content, Document, VIRTUAL_SCHEME};
pub use error::{PipelineError, Result};
pub use invoker::{DEFAULT_MAX_DEPTH, Invoker, StageDescriptor};
pub use schema::{ParamKind, Params, Schema};
pub use selector::{ConditionGroup, Selector, select};

/// A lazy, single-pass stream of documents.
///
/// Errors travel in-band so they surface at the point the consumer pulls
/// them; consumers stop at the first `Err`.
pub type DocumentStream<'a> = Box<dyn Iterator<Item = Result<Document>> + 'a>;

/// A named transformation of a document stream.
///
/// Stages must:
/// - never mutate a document they do not yield;
/// - keep the relative order of documents they pass through, unless
///   reordering is their purpose;
/// - pull from their input only as far as needed, unless they inherently
///   aggregate (and then say so in their docs).
///
/// Stages may mutate documents before yielding them and may synthesize new
/// ones (see [`Document::synthesized`]).
pub trait Stage: Send + Sync {
    /// Unique name for this stage, as used in pipeline definitions.
    fn name(&self) -> &'static str;

    /// Parameters this stage accepts.
    fn schema(&self) -> Schema;

    /// Build this stage's output stream.
    ///
    /// `params` have already been validated against [`Stage::schema`] with
    /// defaults applied. Returning `Err` here aborts the pipeline before any
    /// document is pulled; errors that only show up while streaming are
    /// yielded as `Err` items instead.
    fn process<'a>(
        &self,
        ctx: ProcessContext<'a>,
        stream: DocumentStream<'a>,
        params: Params,
    ) -> Result<DocumentStream<'a>>;
}

/// Apply `f` to the documents matching `selector`, passing the rest
/// through untouched and in order.
pub fn transform_selected<'a, F>(
    stream: DocumentStream<'a>,
    selector: Selector,
    mut f: F,
) -> DocumentStream<'a>
where
    F: FnMut(Document) -> Result<Document> + 'a,
{
    Box::new(stream.map(move |item| {
        let doc = item?;
        if selector.matches(&doc) { f(doc) } else { Ok(doc) }
    }))
}

/// Turn an aggregating step into a lazy stream.
///
/// Nothing happens until the first pull. Then the whole input is drained
/// into memory and handed to `aggregate`, whose output is streamed from
/// the buffer. An upstream error hit while draining is reported as
/// [`PipelineError::Upstream`] on behalf of `stage`, and nothing of the
/// aggregate is emitted.
pub fn materialize<'a, F>(stage: &'static str, stream: DocumentStream<'a>, aggregate: F) -> DocumentStream<'a>
where
    F: FnOnce(Vec<Document>) -> Result<Vec<Document>> + 'a,
{
    let mut pending = Some((stream, aggregate));
    let mut buffered = Vec::new().into_iter();

    Box::new(std::iter::from_fn(move || {
        if let Some((stream, aggregate)) = pending.take() {
            let docs = match stream.collect::<Result<Vec<_>>>() {
                Ok(docs) => docs,
                Err(e) => return Some(Err(PipelineError::upstream(stage, e))),
            };
            match aggregate(docs) {
                Ok(docs) => buffered = docs.into_iter(),
                Err(e) => return Some(Err(e)),
            }
        }
        buffered.next().map(Ok)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    fn docs(names: &[&str]) -> Vec<Result<Document>> {
        names.iter().map(|n| Ok(Document::new(*n, *n, ""))).collect()
    }

    #[test]
    fn test_transform_selected_leaves_others_alone() {
        let selector: Selector = serde_json::from_value(json!([{"destination": "b"}])).unwrap();
        let out: Vec<_> = transform_selected(Box::new(docs(&["a", "b", "c"]).into_iter()), selector, |mut d| {
            d.destination = "B".into();
            Ok(d)
        })
        .map(|d| d.unwrap().destination)
        .collect();
        assert_eq!(out, vec!["a", "B", "c"]);
    }

    #[test]
    fn test_materialize_is_lazy_until_pulled() {
        let called = Cell::new(false);
        let mut out = materialize("agg", Box::new(docs(&["a", "b"]).into_iter()), |mut all| {
            called.set(true);
            all.reverse();
            Ok(all)
        });
        assert!(!called.get());
        assert_eq!(out.next().unwrap().unwrap().destination, "b");
        assert!(called.get());
        assert_eq!(out.next().unwrap().unwrap().destination, "a");
        assert!(out.next().is_none());
    }

    #[test]
    fn test_materialize_wraps_upstream_errors() {
        let mut input = docs(&["a"]);
        input.push(Err(PipelineError::constraint("source", "unreadable")));
        let mut out = materialize("agg", Box::new(input.into_iter()), |all| Ok(all));

        let err = out.next().unwrap().unwrap_err();
        assert!(matches!(err, PipelineError::Upstream { ref stage, .. } if stage == "agg"));
        assert!(out.next().is_none());
    }

    #[test]
    fn test_materialize_aggregate_error_emits_nothing() {
        let mut out = materialize("agg", Box::new(docs(&["a"]).into_iter()), |_| {
            Err(PipelineError::constraint("agg", "nope"))
        });
        assert!(out.next().unwrap().is_err());
        assert!(out.next().is_none());
    }
}
