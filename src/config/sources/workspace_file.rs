//! Project files under `<root>/config/`

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::{Path, PathBuf};

/// Existing project config files, lowest precedence first:
/// `treelens.toml`, then `{TREELENS_ENV}.toml` (default `development`).
pub fn config_files(root: &Path) -> Vec<PathBuf> {
    let env_name = std::env::var("TREELENS_ENV").unwrap_or_else(|_| "development".to_string());
    let config_dir = root.join("config");
    [
        config_dir.join("treelens.toml"),
        config_dir.join(format!("{}.toml", env_name)),
    ]
    .into_iter()
    .filter(|path| path.is_file())
    .collect()
}

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(config_files(root)
        .into_iter()
        .fold(builder, |builder, path| builder.add_source(File::from(path))))
}
