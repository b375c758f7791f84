// Test utility module for wiremap integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use wiremap::config::WiremapConfig;
use wiremap::diagnostics::{Diagnostic, DiagnosticCode};
use wiremap::model::{parse_module, ModelFormat, ModuleModel, TypeUniverse};
use wiremap::pipeline::{compile, CompilationOutput};

/// Parse a YAML module fixture.
pub fn module(yaml: &str) -> ModuleModel {
    parse_module(yaml, ModelFormat::Yaml).expect("fixture should parse")
}

/// Compile a single module with no references under the default config.
pub fn compile_yaml(yaml: &str) -> CompilationOutput {
    compile_with(yaml, &WiremapConfig::default())
}

pub fn compile_with(yaml: &str, config: &WiremapConfig) -> CompilationOutput {
    let module = module(yaml);
    compile(&TypeUniverse::for_module(&module, &[]), config)
}

/// Diagnostic codes in emission order.
pub fn codes(output: &CompilationOutput) -> Vec<&'static str> {
    output.diagnostics.iter().map(|d| d.code.as_str()).collect()
}

pub fn with_code(output: &CompilationOutput, code: DiagnosticCode) -> Vec<&Diagnostic> {
    output.diagnostics.with_code(code).collect()
}

pub fn registered(output: &CompilationOutput) -> Vec<&str> {
    output
        .plan
        .registrations
        .iter()
        .map(|r| r.identity.as_str())
        .collect()
}

pub fn write_module(dir: &Path, file_name: &str, contents: &str) -> PathBuf {
    let path = dir.join(file_name);
    fs::write(&path, contents).expect("write fixture");
    path
}
