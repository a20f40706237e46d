//! Built-in pipeline stages.
//!
//! - **SourceStage** (`source`) - Read files from a directory into documents
//! - **MetadataStage** (`metadata`) - Attach metadata to selected documents
//! - **PrettyUriStage** (`prettyuri`) - Serve pages from directory URLs
//! - **RenderStage** (`render`) - Render documents through templates
//! - **SitemapStage** (`sitemap`) - Generate a sitemap of selected documents
//! - **PipeStage** (`pipe`) - Run a nested pipeline
//! - **SaveStage** (`save`) - Write documents to the output directory

mod metadata;
mod pipe;
mod prettyuri;
mod render;
mod save;
mod sitemap;
mod source;

pub use metadata::MetadataStage;
pub use pipe::PipeStage;
pub use prettyuri::PrettyUriStage;
pub use render::RenderStage;
pub use save::SaveStage;
pub use sitemap::SitemapStage;
pub use source::SourceStage;
