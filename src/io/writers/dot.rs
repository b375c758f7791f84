use crate::emit::render_dot;
use crate::io::output::OutputWriter;
use crate::pipeline::CompilationReport;
use std::io::Write;

/// One Graphviz digraph per compiled module.
pub struct DotWriter<W: Write> {
    writer: W,
}

impl<W: Write> DotWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for DotWriter<W> {
    fn write_report(&mut self, report: &CompilationReport) -> anyhow::Result<()> {
        for output in &report.modules {
            writeln!(self.writer, "// module {}", output.module)?;
            writeln!(self.writer, "{}", render_dot(&output.descriptors, &output.graph))?;
        }
        Ok(())
    }
}
