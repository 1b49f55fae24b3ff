use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use assist_engine::ExtensionConfig;

const DEFAULT_CONFIG_FILENAME: &str = "assist.ron";

/// Load the config from `path`, or `assist.ron` when none is given.
///
/// A missing file means defaults; a file that does not parse is an error.
pub(crate) fn load_config(path: Option<&Path>) -> anyhow::Result<ExtensionConfig> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME));
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ExtensionConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read config {}", path.display()))
        }
    };
    ron::from_str(&content).with_context(|| format!("failed to parse config {}", path.display()))
}
