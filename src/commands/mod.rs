pub mod list;
pub mod run;

use std::path::PathBuf;

use siteflow::config::Config;

/// Load the config file named on the command line.
///
/// Returns the config together with its absolute path.
async fn load_config(config_file: Option<&PathBuf>) -> Result<(Config, PathBuf), anyhow::Error> {
    let config_path = Config::resolve_path(config_file.map(PathBuf::as_path))?;
    let config = Config::load_from_file(&config_path).await?;
    Ok((config, config_path))
}
