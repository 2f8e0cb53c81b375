use crate::Result;
use crate::eval::EvaluationReport;
use core::fmt::Write;

pub fn generate<W: Write>(report: &EvaluationReport, pretty: bool, writer: &mut W) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };

    writeln!(writer, "{text}")?;
    Ok(())
}
