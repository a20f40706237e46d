use siteflow::pipeline::Invoker;

use crate::ListArgs;

pub async fn run(args: &ListArgs) -> Result<(), anyhow::Error> {
    let (config, _) = super::load_config(args.config_file.as_ref()).await?;

    println!("Pipes:");
    for (name, descriptors) in &config.pipes {
        let stages = descriptors
            .iter()
            .map(|d| d.name.as_str())
            .collect::<Vec<_>>()
            .join(" -> ");
        println!("  {name}: {stages}");
    }

    println!("Stages:");
    let invoker = Invoker::with_default_stages();
    for name in invoker.stage_names() {
        println!("  {name}");
    }

    Ok(())
}
