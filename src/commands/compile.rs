use crate::config::{load_config, load_config_from, WiremapConfig};
use crate::diagnostics::ReportSeverity;
use crate::io::{self, create_writer, find_module_files, OutputFormat};
use crate::model::load_modules;
use crate::pipeline::{compile_modules, required_registries, CompilationReport};
use crate::registry::ConflictPolicy;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

pub struct CompileConfig {
    pub paths: Vec<PathBuf>,
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub lifetime_mismatch: Option<ReportSeverity>,
    pub captive_dependency: Option<ReportSeverity>,
    pub conflict_policy: Option<ConflictPolicy>,
}

impl CompileConfig {
    /// Command-line flags take precedence over the configuration file.
    fn apply_overrides(&self, mut config: WiremapConfig) -> WiremapConfig {
        if let Some(severity) = self.lifetime_mismatch {
            config.lifetime_mismatch = severity;
        }
        if let Some(severity) = self.captive_dependency {
            config.captive_dependency = severity;
        }
        if let Some(policy) = self.conflict_policy {
            config.conflict_policy = policy;
        }
        config
    }

    fn load_config(&self) -> Result<WiremapConfig> {
        let config = match &self.config {
            Some(path) => load_config_from(path)?,
            None => load_config()?,
        };
        Ok(self.apply_overrides(config))
    }
}

/// Compile, report and return whether the run was free of errors.
pub fn handle_compile(options: CompileConfig) -> Result<bool> {
    let config = options.load_config()?;

    let files = find_module_files(&options.paths, &config.ignore.patterns)?;
    if files.is_empty() {
        anyhow::bail!("no module files found");
    }
    tracing::info!("compiling {} module file(s)", files.len());

    let modules = load_modules(&files)?;
    let outputs = compile_modules(&modules, &config);
    let report = CompilationReport::assemble(
        outputs,
        &required_registries(&modules),
        config.conflict_policy,
    );

    write_report(&report, options.format, options.output.as_ref())?;
    Ok(!report.has_errors())
}

fn write_report(
    report: &CompilationReport,
    format: OutputFormat,
    output: Option<&PathBuf>,
) -> Result<()> {
    match (format, output) {
        (OutputFormat::Rust, Some(dir)) => {
            let written = io::write_sources(dir, &report.modules)?;
            tracing::info!("wrote {} generated file(s) to {}", written.len(), dir.display());
        }
        (_, Some(path)) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut writer = create_writer(format, Box::new(BufWriter::new(file)));
            writer.write_report(report)?;
        }
        (_, None) => {
            let stdout = std::io::stdout();
            let mut writer = create_writer(format, Box::new(stdout.lock()));
            writer.write_report(report)?;
            std::io::stdout().flush()?;
        }
    }
    Ok(())
}
