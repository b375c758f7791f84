use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::core::WiremapConfig;
use crate::errors::{Result, WiremapError};

pub const CONFIG_FILE_NAME: &str = ".wiremap.toml";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Pure function to read config file contents
pub(crate) fn read_config_file(path: &Path) -> std::result::Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Pure function to parse and validate config from TOML string
pub fn parse_and_validate_config(contents: &str) -> std::result::Result<WiremapConfig, String> {
    let config = toml::from_str::<WiremapConfig>(contents)
        .map_err(|e| format!("Failed to parse {}: {}", CONFIG_FILE_NAME, e))?;
    config.validate()?;
    Ok(config)
}

/// Load an explicitly named config file; a missing or invalid file is an error.
pub fn load_config_from(path: &Path) -> Result<WiremapConfig> {
    let contents = read_config_file(path).map_err(|e| WiremapError::io(path, e))?;
    parse_and_validate_config(&contents).map_err(|e| WiremapError::config_with_path(e, path))
}

/// Try one candidate location during discovery
pub(crate) fn try_load_config_from_path(config_path: &Path) -> Option<Result<WiremapConfig>> {
    match read_config_file(config_path) {
        Ok(contents) => Some(
            parse_and_validate_config(&contents)
                .map(|config| {
                    tracing::debug!("Loaded config from {}", config_path.display());
                    config
                })
                .map_err(|e| WiremapError::config_with_path(e, config_path)),
        ),
        Err(e) => {
            handle_read_error(config_path, &e);
            None
        }
    }
}

/// Handle file read errors with appropriate logging
pub(crate) fn handle_read_error(config_path: &Path, error: &std::io::Error) {
    // Only log actual errors, not "file not found"
    if error.kind() != std::io::ErrorKind::NotFound {
        tracing::warn!(
            "Failed to read config file {}: {}",
            config_path.display(),
            error
        );
    }
}

/// Pure function to generate directory ancestors up to a depth limit
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Find `.wiremap.toml` in `start` or one of its ancestors.
///
/// The nearest file wins; an invalid nearest file is an error rather than a
/// silent fallback to defaults.
pub fn discover_config(start: &Path) -> Result<WiremapConfig> {
    directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            tracing::debug!(
                "No config found after checking {} directories. Using default config.",
                MAX_TRAVERSAL_DEPTH
            );
            Ok(WiremapConfig::default())
        })
}

/// Discover the configuration starting from the current directory.
pub fn load_config() -> Result<WiremapConfig> {
    match std::env::current_dir() {
        Ok(dir) => discover_config(&dir),
        Err(e) => {
            tracing::warn!(
                "Failed to get current directory: {}. Using default config.",
                e
            );
            Ok(WiremapConfig::default())
        }
    }
}
