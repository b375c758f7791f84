pub mod output;
pub mod walker;
pub mod writers;

pub use output::{create_writer, OutputFormat, OutputWriter};
pub use walker::{find_module_files, is_module_file, ModuleWalker};

use crate::pipeline::CompilationOutput;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
    }
    Ok(())
}

/// Write each module's generated sources under `root/<module>/`.
///
/// Returns the written paths in output order.
pub fn write_sources(root: &Path, outputs: &[CompilationOutput]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for output in outputs {
        let dir = root.join(&output.module);
        ensure_dir(&dir)?;
        for source in &output.sources {
            let path = dir.join(&source.path);
            write_file(&path, &source.contents)?;
            written.push(path);
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::writers::fixtures;
    use tempfile::TempDir;

    #[test]
    fn test_write_sources_lays_out_per_module() -> Result<()> {
        let dir = TempDir::new()?;
        let report = fixtures::report();
        let written = write_sources(dir.path(), &report.modules)?;

        assert_eq!(written.len(), 3);
        assert!(dir.path().join("app/registrations.rs").is_file());
        let proxies = fs::read_to_string(dir.path().join("app/proxies.rs"))?;
        assert!(proxies.starts_with(crate::emit::GENERATED_HEADER));
        Ok(())
    }
}
