//! siteflow builds static sites by streaming documents through pipelines of
//! small, independently configured stages.
//!
//! See [`pipeline`] for the engine and [`pipeline::stages`] for the
//! built-in stages.

pub mod config;
pub mod paths;
pub mod pipeline;
pub mod render;
