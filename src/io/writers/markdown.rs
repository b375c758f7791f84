use crate::diagnostics::{Diagnostics, Severity};
use crate::emit::RegistrationPlan;
use crate::io::output::OutputWriter;
use crate::pipeline::{CompilationOutput, CompilationReport};
use std::io::Write;

pub struct MarkdownWriter<W: Write> {
    writer: W,
}

impl<W: Write> MarkdownWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for MarkdownWriter<W> {
    fn write_report(&mut self, report: &CompilationReport) -> anyhow::Result<()> {
        self.write_header(report)?;
        for output in &report.modules {
            self.write_module(output)?;
        }
        self.write_aggregation(report)?;
        Ok(())
    }
}

impl<W: Write> MarkdownWriter<W> {
    fn write_header(&mut self, report: &CompilationReport) -> anyhow::Result<()> {
        writeln!(self.writer, "# Wiremap Compilation Report")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Metric | Value |")?;
        writeln!(self.writer, "|--------|-------|")?;
        writeln!(self.writer, "| Modules | {} |", report.modules.len())?;
        writeln!(self.writer, "| Errors | {} |", report.count(Severity::Error))?;
        writeln!(self.writer, "| Warnings | {} |", report.count(Severity::Warning))?;
        writeln!(self.writer, "| Info | {} |", report.count(Severity::Info))?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_module(&mut self, output: &CompilationOutput) -> anyhow::Result<()> {
        writeln!(self.writer, "## Module `{}`", output.module)?;
        writeln!(self.writer)?;
        writeln!(self.writer, "Fingerprint: `{}`", output.fingerprint)?;
        writeln!(self.writer)?;
        self.write_plan(&output.plan)?;
        self.write_diagnostics(&output.diagnostics)?;
        Ok(())
    }

    fn write_plan(&mut self, plan: &RegistrationPlan) -> anyhow::Result<()> {
        if plan.registrations.is_empty() {
            writeln!(self.writer, "_No registrations._")?;
            writeln!(self.writer)?;
        } else {
            writeln!(self.writer, "### Registrations")?;
            writeln!(self.writer)?;
            writeln!(self.writer, "| Identity | Capabilities | Lifetime | Construction |")?;
            writeln!(self.writer, "|----------|--------------|----------|--------------|")?;
            for r in &plan.registrations {
                writeln!(
                    self.writer,
                    "| {} | {} | {} | `{}` |",
                    r.identity,
                    r.capabilities.join(", "),
                    r.lifetime,
                    r.construction
                )?;
            }
            writeln!(self.writer)?;
        }

        if !plan.decorators.is_empty() {
            writeln!(self.writer, "### Decorators")?;
            writeln!(self.writer)?;
            for group in &plan.decorators {
                writeln!(
                    self.writer,
                    "- `{}`: {}",
                    group.capability,
                    group.identities().join(" → ")
                )?;
                for chain in &group.chains {
                    writeln!(self.writer, "  - `{}`", chain.expression)?;
                }
            }
            writeln!(self.writer)?;
        }

        if !plan.factories.is_empty() {
            writeln!(self.writer, "### Factories")?;
            writeln!(self.writer)?;
            for factory in &plan.factories {
                let methods: Vec<&str> = factory.methods.iter().map(|m| m.name.as_str()).collect();
                writeln!(
                    self.writer,
                    "- `{}` builds `{}`: {}",
                    factory.identity,
                    factory.target,
                    methods.join(", ")
                )?;
            }
            writeln!(self.writer)?;
        }

        if !plan.proxies.is_empty() {
            writeln!(self.writer, "### Proxies")?;
            writeln!(self.writer)?;
            for proxy in &plan.proxies {
                writeln!(self.writer, "- `{}` wraps `{}`", proxy.identity, proxy.target)?;
                for method in proxy.wrapped_methods() {
                    writeln!(
                        self.writer,
                        "  - `{}`: {}",
                        method.name,
                        method.interceptors.join(", ")
                    )?;
                }
            }
            writeln!(self.writer)?;
        }

        if !plan.hosted.is_empty() {
            writeln!(self.writer, "Hosted: {}", plan.hosted.join(", "))?;
            writeln!(self.writer)?;
        }
        Ok(())
    }

    fn write_diagnostics(&mut self, diagnostics: &Diagnostics) -> anyhow::Result<()> {
        if diagnostics.is_empty() {
            return Ok(());
        }

        writeln!(self.writer, "### Diagnostics")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Severity | Code | Location | Message |")?;
        writeln!(self.writer, "|----------|------|----------|---------|")?;
        for d in diagnostics {
            let location = d
                .location
                .as_ref()
                .map(|l| l.to_string())
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                self.writer,
                "| {} | {} | {} | {} |",
                d.severity,
                d.code,
                location,
                d.message.replace('|', "\\|")
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_aggregation(&mut self, report: &CompilationReport) -> anyhow::Result<()> {
        writeln!(self.writer, "## Aggregated Plan")?;
        writeln!(self.writer)?;
        match (&report.merged, &report.aggregation_error) {
            (_, Some(error)) => writeln!(self.writer, "**Aggregation failed:** {}", error)?,
            (Some(merged), None) => writeln!(
                self.writer,
                "{} registration(s) across {} module(s).",
                merged.registrations.len(),
                report.modules.len()
            )?,
            (None, None) => writeln!(self.writer, "_Nothing to aggregate._")?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::writers::fixtures::render;

    #[test]
    fn test_markdown_lists_registrations_and_diagnostics() {
        let text = render(|buffer, report| {
            MarkdownWriter::new(buffer).write_report(report).unwrap();
        });

        assert!(text.starts_with("# Wiremap Compilation Report"));
        assert!(text.contains("| Warnings | 1 |"));
        assert!(text.contains("## Module `app`"));
        assert!(text.contains("| Report | Report | Singleton | `Report::new(ctx.resolve::<Clock>())` |"));
        assert!(text.contains("| warning | WM0302 |"));
        assert!(text.contains("2 registration(s) across 1 module(s)."));
    }
}
