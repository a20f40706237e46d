use anyhow::Context;
use siteflow::{
    paths::base_path_from_config,
    pipeline::{Invoker, ProcessContext},
};
use tracing::{info, warn};

use crate::RunArgs;

pub async fn run(args: &RunArgs) -> Result<(), anyhow::Error> {
    let (config, config_path) = super::load_config(args.config_file.as_ref()).await?;
    let descriptors = config.pipe(&args.pipe)?;

    // Relative paths in stage arguments resolve against the config file's directory
    let base_path = base_path_from_config(&config_path);

    if config.site_url().is_none() {
        warn!("metadata.url is not set; sitemap URLs will be site-relative");
    }

    let mut invoker = Invoker::with_default_stages();
    invoker.set_max_depth(config.max_depth);
    let ctx = ProcessContext::new(&invoker, &config.metadata, &base_path);

    info!(pipe = %args.pipe, stages = descriptors.len(), "running pipe");
    let stream = invoker
        .invoke(ctx, descriptors, Box::new(std::iter::empty()))
        .with_context(|| format!("failed to build pipe '{}'", args.pipe))?;

    // Drain the stream; stages like `save` do their work as documents pass.
    let mut documents = 0;
    for doc in stream {
        doc.with_context(|| format!("pipe '{}' failed", args.pipe))?;
        documents += 1;
    }

    println!("Ran pipe '{}' ({} documents)", args.pipe, documents);

    Ok(())
}
