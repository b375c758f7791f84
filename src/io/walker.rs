use anyhow::Result;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Suffixes a module file may carry when found by walking a directory.
const MODULE_SUFFIXES: &[&str] = &[
    ".wiremap.json",
    ".wiremap.yaml",
    ".wiremap.yml",
    ".wiremap.toml",
];

pub fn is_module_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| {
            MODULE_SUFFIXES
                .iter()
                .any(|s| name.len() > s.len() && name.ends_with(s))
        })
}

pub struct ModuleWalker {
    root: PathBuf,
    ignore_patterns: Vec<String>,
}

impl ModuleWalker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            ignore_patterns: vec![],
        }
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    pub fn walk(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .build();

        for entry in walker {
            let entry = entry?;
            let path = entry.path();

            if path.is_file() && self.should_process(path) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    fn should_process(&self, path: &Path) -> bool {
        if !is_module_file(path) {
            return false;
        }

        let path_str = path.to_string_lossy();
        !self.ignore_patterns.iter().any(|pattern| {
            glob::Pattern::new(pattern)
                .map(|p| p.matches(&path_str))
                .unwrap_or(false)
        })
    }
}

/// Expand command-line paths into module files.
///
/// A file named explicitly is taken as is, whatever its name; directories are
/// walked for `*.wiremap.*` files. The result is sorted and free of repeats.
pub fn find_module_files(paths: &[PathBuf], ignore_patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(
                ModuleWalker::new(path.clone())
                    .with_ignore_patterns(ignore_patterns.to_vec())
                    .walk()?,
            );
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            anyhow::bail!("path does not exist: {}", path.display());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_module_file() {
        assert!(is_module_file(Path::new("app.wiremap.json")));
        assert!(is_module_file(Path::new("dir/infra.wiremap.yml")));
        assert!(!is_module_file(Path::new("app.json")));
        assert!(!is_module_file(Path::new("Cargo.toml")));
        assert!(!is_module_file(Path::new(".wiremap.toml")));
    }

    #[test]
    fn test_walk_finds_module_files_and_honours_ignores() -> Result<()> {
        let dir = TempDir::new()?;
        fs::create_dir_all(dir.path().join("nested"))?;
        fs::create_dir_all(dir.path().join("vendor"))?;
        fs::write(dir.path().join("app.wiremap.yaml"), "name: app")?;
        fs::write(dir.path().join("nested/infra.wiremap.toml"), "name = \"infra\"")?;
        fs::write(dir.path().join("vendor/lib.wiremap.json"), "{\"name\":\"lib\"}")?;
        fs::write(dir.path().join("notes.md"), "# notes")?;

        let files = ModuleWalker::new(dir.path().to_path_buf())
            .with_ignore_patterns(vec!["**/vendor/**".into()])
            .walk()?;
        let names: Vec<String> = files
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(names, vec!["app.wiremap.yaml", "infra.wiremap.toml"]);
        Ok(())
    }

    #[test]
    fn test_find_module_files_rejects_missing_paths() {
        let missing = PathBuf::from("/definitely/not/here");
        assert!(find_module_files(&[missing], &[]).is_err());
    }

    #[test]
    fn test_explicit_file_is_taken_once() -> Result<()> {
        let dir = TempDir::new()?;
        let file = dir.path().join("custom.yaml");
        fs::write(&file, "name: app")?;
        let files = find_module_files(&[file.clone(), file.clone()], &[])?;
        assert_eq!(files, vec![file]);
        Ok(())
    }
}
