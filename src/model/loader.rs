//! Reading module files from disk.

use super::universe::ModuleModel;
use crate::errors::{Result, WiremapError};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Serialization formats a module file may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Json,
    Yaml,
    Toml,
}

impl ModelFormat {
    /// Pure function to pick a format from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// Pure function to parse a module from text.
pub fn parse_module(contents: &str, format: ModelFormat) -> std::result::Result<ModuleModel, String> {
    match format {
        ModelFormat::Json => serde_json::from_str(contents).map_err(|e| e.to_string()),
        ModelFormat::Yaml => serde_yaml::from_str(contents).map_err(|e| e.to_string()),
        ModelFormat::Toml => toml::from_str(contents).map_err(|e| e.to_string()),
    }
}

pub fn load_module(path: &Path) -> Result<ModuleModel> {
    let format = ModelFormat::from_path(path).ok_or_else(|| WiremapError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    let contents = fs::read_to_string(path).map_err(|e| WiremapError::io(path, e))?;
    let module = parse_module(&contents, format).map_err(|e| WiremapError::model_parse(path, e))?;
    tracing::debug!(
        module = %module.name,
        types = module.types.len(),
        "loaded module file {}",
        path.display()
    );
    Ok(module)
}

/// Load every module file, rejecting two files that declare the same module.
pub fn load_modules(paths: &[PathBuf]) -> Result<Vec<ModuleModel>> {
    let mut seen: BTreeMap<String, PathBuf> = BTreeMap::new();
    let mut modules = Vec::with_capacity(paths.len());

    for path in paths {
        let module = load_module(path)?;
        if let Some(first) = seen.get(&module.name) {
            return Err(WiremapError::DuplicateModule {
                module: module.name,
                first: first.clone(),
                second: path.clone(),
            });
        }
        seen.insert(module.name.clone(), path.clone());
        modules.push(module);
    }

    Ok(modules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Attribute;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ModelFormat::from_path(Path::new("app.wiremap.yml")),
            Some(ModelFormat::Yaml)
        );
        assert_eq!(ModelFormat::from_path(Path::new("app.txt")), None);
    }

    #[test]
    fn test_parse_toml_module() {
        let contents = r#"
name = "app"

[[types]]
name = "Clock"
implements = ["TimeSource"]
attributes = [{ kind = "lifetime", value = "singleton" }, { kind = "hosted" }]

[[types.constructors]]
parameters = []
"#;
        let module = parse_module(contents, ModelFormat::Toml).unwrap();
        assert_eq!(module.types.len(), 1);
        assert_eq!(module.types[0].attributes[1], Attribute::Hosted);
        assert_eq!(module.types[0].constructors.len(), 1);
    }

    #[test]
    fn test_parse_reports_unknown_fields() {
        let err = parse_module(r#"{"name":"app","bogus":1}"#, ModelFormat::Json).unwrap_err();
        assert!(err.contains("bogus"));
    }

    #[test]
    fn test_load_modules_rejects_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.wiremap.json");
        let b = dir.path().join("b.wiremap.json");
        fs::write(&a, r#"{"name":"app"}"#).unwrap();
        fs::write(&b, r#"{"name":"app"}"#).unwrap();

        let err = load_modules(&[a, b]).unwrap_err();
        assert!(matches!(err, WiremapError::DuplicateModule { .. }));
    }
}
