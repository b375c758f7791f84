//! Configuration for a compilation run.
//!
//! Policy toggles (lifetime-check severities, default lifetime, merge
//! conflict policy) come from `.wiremap.toml`, found by walking up from the
//! working directory, and may be overridden on the command line.

mod core;
mod loader;

pub use self::core::{IgnoreConfig, WiremapConfig};
pub use loader::{
    directory_ancestors, discover_config, load_config, load_config_from,
    parse_and_validate_config, CONFIG_FILE_NAME,
};
