use super::writers::{DotWriter, JsonWriter, MarkdownWriter, RustWriter, TerminalWriter};
use crate::pipeline::CompilationReport;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Markdown,
    Terminal,
    /// Generated sources only.
    Rust,
    /// Dependency graphs in Graphviz form.
    Dot,
}

pub trait OutputWriter {
    fn write_report(&mut self, report: &CompilationReport) -> anyhow::Result<()>;
}

pub fn create_writer<'a>(format: OutputFormat, writer: Box<dyn Write + 'a>) -> Box<dyn OutputWriter + 'a> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter::new(writer)),
        OutputFormat::Markdown => Box::new(MarkdownWriter::new(writer)),
        OutputFormat::Terminal => Box::new(TerminalWriter::new(writer)),
        OutputFormat::Rust => Box::new(RustWriter::new(writer)),
        OutputFormat::Dot => Box::new(DotWriter::new(writer)),
    }
}
