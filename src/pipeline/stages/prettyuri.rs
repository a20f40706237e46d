//! Pretty URL stage.
//!
//! Rewrites destinations so pages are served from directory URLs,
//! e.g. `about/contact.html` becomes `about/contact/index.html` and is
//! served at `/about/contact/`.

use serde::Deserialize;

use crate::paths::pretty_destination;
use crate::pipeline::{
    DocumentStream, Params, ProcessContext, Result, Schema, Selector, Stage, transform_selected,
};

/// Stage that moves selected documents to `<path-without-extension>/index.html`.
///
/// Most HTTP servers serve `index.html` (or `index.htm`) when a directory
/// is requested, so documents already named like that are left alone.
///
/// Streams one document at a time and buffers nothing.
pub struct PrettyUriStage;

#[derive(Deserialize)]
struct PrettyUriParams {
    when: Selector,
}

impl Stage for PrettyUriStage {
    fn name(&self) -> &'static str {
        "prettyuri"
    }

    fn schema(&self) -> Schema {
        Schema::new().selector()
    }

    fn process<'a>(
        &self,
        _ctx: ProcessContext<'a>,
        stream: DocumentStream<'a>,
        params: Params,
    ) -> Result<DocumentStream<'a>> {
        let params: PrettyUriParams = params.decode()?;

        Ok(transform_selected(stream, params.when, |mut doc| {
            doc.destination = pretty_destination(&doc.destination);
            Ok(doc)
        }))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::test_support::{docs, run};
    use crate::pipeline::StageDescriptor;

    fn prettify(destinations: &[&str]) -> Vec<String> {
        run(json!({}), &[StageDescriptor::new("prettyuri")], docs(destinations))
            .unwrap()
            .into_iter()
            .map(|d| d.destination)
            .collect()
    }

    #[test]
    fn test_rewrites_plain_pages() {
        assert_eq!(prettify(&["about/contact.html"]), vec!["about/contact/index.html"]);
        assert_eq!(prettify(&["about.html"]), vec!["about/index.html"]);
    }

    #[test]
    fn test_keeps_index_files() {
        assert_eq!(
            prettify(&["index.html", "blog/index.html", "docs/index.htm"]),
            vec!["index.html", "blog/index.html", "docs/index.htm"]
        );
    }

    #[test]
    fn test_directory_destination_gets_single_slash_url() {
        let out = run(json!({}), &[StageDescriptor::new("prettyuri")], docs(&["blog/"])).unwrap();
        assert_eq!(out[0].destination, "blog/index.html");
        assert_eq!(out[0].url(), "/blog/");
    }

    #[test]
    fn test_preserves_order_and_other_fields() {
        let out = run(
            json!({}),
            &[StageDescriptor::new("prettyuri")],
            docs(&["b.html", "index.html", "a.html"]),
        )
        .unwrap();

        let pairs: Vec<_> = out
            .iter()
            .map(|d| (d.source(), d.destination.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("b.html", "b/index.html"),
                ("index.html", "index.html"),
                ("a.html", "a/index.html"),
            ]
        );
    }

    #[test]
    fn test_only_selected_documents_are_rewritten() {
        let pipeline = [StageDescriptor::new("prettyuri")
            .arg("when", json!([{"destination": "a.html"}]))];
        let out = run(json!({}), &pipeline, docs(&["a.html", "b.html"])).unwrap();

        assert_eq!(out[0].destination, "a/index.html");
        assert_eq!(out[1].destination, "b.html");
    }

    #[test]
    fn test_rejects_unknown_params() {
        let pipeline = [StageDescriptor::new("prettyuri").arg("index", "home.html")];
        assert!(run(json!({}), &pipeline, docs(&["a.html"])).is_err());
    }
}
