use crate::io::output::OutputWriter;
use crate::pipeline::CompilationReport;
use std::io::Write;

/// Concatenates every generated source, each preceded by a path banner.
pub struct RustWriter<W: Write> {
    writer: W,
}

impl<W: Write> RustWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for RustWriter<W> {
    fn write_report(&mut self, report: &CompilationReport) -> anyhow::Result<()> {
        for output in &report.modules {
            for source in &output.sources {
                writeln!(self.writer, "// ---- {}/{} ----", output.module, source.path)?;
                self.writer.write_all(source.contents.as_bytes())?;
                writeln!(self.writer)?;
            }
        }
        Ok(())
    }
}
