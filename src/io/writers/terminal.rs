use crate::diagnostics::{Diagnostic, Severity};
use crate::io::output::OutputWriter;
use crate::pipeline::{CompilationOutput, CompilationReport};
use colored::*;
use std::io::Write;

pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_report(&mut self, report: &CompilationReport) -> anyhow::Result<()> {
        writeln!(self.writer, "{}", "═══════════════════════════════════════════".cyan())?;
        writeln!(self.writer, "{}", "           WIREMAP COMPILATION".bold().cyan())?;
        writeln!(self.writer, "{}", "═══════════════════════════════════════════".cyan())?;

        for output in &report.modules {
            self.write_module(output)?;
        }

        writeln!(self.writer)?;
        self.write_status(report)?;
        Ok(())
    }
}

fn severity_label(severity: Severity) -> ColoredString {
    match severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
        Severity::Info => "info".blue(),
    }
}

impl<W: Write> TerminalWriter<W> {
    fn write_module(&mut self, output: &CompilationOutput) -> anyhow::Result<()> {
        let plan = &output.plan;
        writeln!(self.writer)?;
        writeln!(self.writer, "📦 {} {}", "MODULE".bold(), output.module.bold())?;
        writeln!(self.writer, "───────────────────────────────────────────")?;
        writeln!(
            self.writer,
            "  {} registrations, {} decorator groups, {} factories, {} proxies",
            plan.registrations.len(),
            plan.decorators.len(),
            plan.factories.len(),
            plan.proxies.len()
        )?;
        if !plan.hosted.is_empty() {
            writeln!(self.writer, "  hosted: {}", plan.hosted.join(", "))?;
        }
        writeln!(self.writer, "  fingerprint: {}", output.fingerprint.dimmed())?;

        for diagnostic in &output.diagnostics {
            self.write_diagnostic(diagnostic)?;
        }
        Ok(())
    }

    fn write_diagnostic(&mut self, diagnostic: &Diagnostic) -> anyhow::Result<()> {
        writeln!(
            self.writer,
            "  {}[{}]: {}",
            severity_label(diagnostic.severity),
            diagnostic.code,
            diagnostic.message
        )?;
        if let Some(location) = &diagnostic.location {
            writeln!(self.writer, "      {} {}", "-->".blue(), location)?;
        }
        Ok(())
    }

    fn write_status(&mut self, report: &CompilationReport) -> anyhow::Result<()> {
        let errors = report.count(Severity::Error);
        let warnings = report.count(Severity::Warning);

        if let Some(error) = &report.aggregation_error {
            writeln!(self.writer, "{} {}", "aggregation failed:".red().bold(), error)?;
        } else if let Some(merged) = &report.merged {
            writeln!(
                self.writer,
                "Aggregated {} registration(s) from {} module(s)",
                merged.registrations.len(),
                report.modules.len()
            )?;
        }

        let status = if report.has_errors() {
            "✗ FAILED".red().bold()
        } else {
            "✓ OK".green().bold()
        };
        writeln!(
            self.writer,
            "{} ({} error(s), {} warning(s))",
            status, errors, warnings
        )?;
        Ok(())
    }
}
