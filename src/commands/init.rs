use crate::config::CONFIG_FILE_NAME;
use crate::io;
use anyhow::Result;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG: &str = r#"# Wiremap Configuration

# Lifetime for components without a lifetime attribute
default_lifetime = "singleton"

# silent | warn | throw
lifetime_mismatch = "warn"
captive_dependency = "warn"

# Duplicate identities across modules: fail | first_wins | last_wins
conflict_policy = "fail"

disposal_capabilities = ["Disposable", "AsyncDisposable"]
ignored_capabilities = []
collection_wrappers = ["Vec", "Collection"]
deferred_wrappers = ["Lazy", "Provider"]

[ignore]
patterns = [
    "target/**",
    "**/fixtures/**",
]
"#;

/// Write the default configuration into `dir`, returning the file path.
pub fn init_config_in(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    io::write_file(&config_path, DEFAULT_CONFIG)?;
    Ok(config_path)
}

pub fn init_config(force: bool) -> Result<()> {
    init_config_in(Path::new("."), force)?;
    println!("Created {} configuration file", CONFIG_FILE_NAME);
    Ok(())
}
