//! Sitemap generation stage.
//!
//! Generates a sitemap (<https://www.sitemaps.org/protocol.html>) listing
//! the selected documents and appends it to the stream as a new document.

use std::io::Write;

use chrono::{DateTime, NaiveDate};
use flate2::{Compression, write::GzEncoder};
use serde::Deserialize;
use tracing::info;

use crate::paths::url_directory;
use crate::pipeline::{
    Content, Document, DocumentStream, ParamKind, Params, PipelineError, ProcessContext, Result,
    Schema, Selector, Stage, materialize,
};

const STAGE: &str = "sitemap";

/// Namespace of the sitemap protocol.
pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Stage that appends a sitemap of the selected documents to the stream.
///
/// This stage:
/// - Lists the absolute URL and `updated` timestamp of every selected
///   document, in stream order
/// - Optionally gzips the sitemap, appending `.gz` to its file name
/// - Checks every listed URL lives under the sitemap's own directory, as
///   the protocol requires, failing the build otherwise
///
/// All input documents are passed through unchanged, followed by a virtual
/// document holding the UTF-8 encoded sitemap.
///
/// The sitemap can only be rendered once every document has been seen, so
/// the first pull drains and buffers the stage's entire input.
pub struct SitemapStage;

#[derive(Deserialize)]
struct SitemapParams {
    when: Selector,
    gzip: bool,
    save_as: String,
}

/// A sitemap URL entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapUrl {
    /// Absolute URL location
    pub loc: String,
    /// Last modification time, as written to the sitemap
    pub lastmod: Option<String>,
}

impl SitemapUrl {
    fn from_document(doc: &Document, base_url: &str) -> Result<Self> {
        let lastmod = doc
            .get_str("updated")
            .map(|updated| check_timestamp(updated, doc))
            .transpose()?;

        Ok(Self {
            loc: doc.absolute_url(base_url),
            lastmod,
        })
    }
}

impl Stage for SitemapStage {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .selector()
            .optional("gzip", ParamKind::Boolean, false)
            .optional("save_as", ParamKind::String, "sitemap.xml")
    }

    fn process<'a>(
        &self,
        ctx: ProcessContext<'a>,
        stream: DocumentStream<'a>,
        params: Params,
    ) -> Result<DocumentStream<'a>> {
        let params: SitemapParams = params.decode()?;
        let base_url = ctx.base_url();

        Ok(materialize(STAGE, stream, move |mut docs| {
            let sitemap = build_sitemap(&docs, &params, base_url)?;
            docs.push(sitemap);
            Ok(docs)
        }))
    }
}

fn build_sitemap(docs: &[Document], params: &SitemapParams, base_url: &str) -> Result<Document> {
    let urls = docs
        .iter()
        .filter(|doc| params.when.matches(doc))
        .map(|doc| SitemapUrl::from_document(doc, base_url))
        .collect::<Result<Vec<_>>>()?;

    let mut save_as = params.save_as.clone();
    let mut content = render_sitemap(&urls).into_bytes();
    if params.gzip {
        content = gzip(&content).map_err(|e| PipelineError::io(STAGE, &save_as, e))?;
        save_as.push_str(".gz");
    }

    let sitemap = Document::synthesized(STAGE, save_as, Content::Bytes(content));
    check_urls(&sitemap, &urls, base_url)?;

    info!(
        destination = %sitemap.destination,
        urls = urls.len(),
        "generated sitemap"
    );
    Ok(sitemap)
}

/// The location of a sitemap determines the URLs it may list: a sitemap at
/// `https://x/docs/sitemap.xml` may only include URLs under `https://x/docs/`.
fn check_urls(sitemap: &Document, urls: &[SitemapUrl], base_url: &str) -> Result<()> {
    let sitemap_url = sitemap.absolute_url(base_url);
    let allowed = url_directory(&sitemap_url);

    match urls.iter().find(|url| !url.loc.starts_with(allowed)) {
        Some(url) => Err(PipelineError::constraint(
            STAGE,
            format!(
                "the sitemap at {sitemap_url} can only include URLs starting with {allowed}, \
                 but {} is selected",
                url.loc
            ),
        )),
        None => Ok(()),
    }
}

/// Check an `updated` value is a W3C datetime and return it as written.
///
/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates.
fn check_timestamp(updated: &str, doc: &Document) -> Result<String> {
    let is_datetime = DateTime::parse_from_rfc3339(updated).is_ok();
    let is_date =
        updated.len() == 10 && NaiveDate::parse_from_str(updated, "%Y-%m-%d").is_ok();
    if is_datetime || is_date {
        return Ok(updated.to_string());
    }
    Err(PipelineError::constraint(
        STAGE,
        format!(
            "document '{}' has an invalid 'updated' timestamp: {updated:?}",
            doc.source()
        ),
    ))
}

/// Render sitemap XML for the given URLs, in order.
pub fn render_sitemap(urls: &[SitemapUrl]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!("<urlset xmlns=\"{SITEMAP_NAMESPACE}\">\n"));

    for url in urls {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&url.loc)));
        if let Some(lastmod) = &url.lastmod {
            xml.push_str(&format!("    <lastmod>{}</lastmod>\n", escape_xml(lastmod)));
        }
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

fn gzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
