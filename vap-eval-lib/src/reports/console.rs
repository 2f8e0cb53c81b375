use crate::Result;
use crate::eval::{EvaluationReport, ReportEntry};
use core::fmt::Write;
use owo_colors::OwoColorize;
use serde_json::Value as JsonValue;

pub fn generate<W: Write>(report: &EvaluationReport, use_colors: bool, writer: &mut W) -> Result<()> {
    if let Some(error) = &report.error {
        let label = if use_colors { "error".red().bold().to_string() } else { "error".to_string() };
        writeln!(writer, "{label}: {error}")?;
        return Ok(());
    }

    heading(writer, "Variables", use_colors)?;
    for entry in report.variables.iter().flatten() {
        write_value_entry(writer, entry)?;
    }

    heading(writer, "Match conditions", use_colors)?;
    for entry in report.match_conditions.iter().flatten() {
        write_check_entry(writer, entry, use_colors)?;
    }

    heading(writer, "Validations", use_colors)?;
    match &report.validations {
        Some(validations) => {
            for entry in validations {
                write_check_entry(writer, entry, use_colors)?;
            }
        }
        None => writeln!(writer, "  skipped, match conditions not met")?,
    }

    heading(writer, "Audit annotations", use_colors)?;
    match &report.audit_annotations {
        Some(annotations) => {
            for entry in annotations {
                write_value_entry(writer, entry)?;
            }
        }
        None => writeln!(writer, "  skipped, validations did not all pass")?,
    }

    if let Some(type_checking) = &report.type_checking {
        heading(writer, "Expression warnings", use_colors)?;
        for warning in &type_checking.expression_warnings {
            writeln!(writer, "  {}: {}", warning.field_ref, warning.warning)?;
        }
    }

    writeln!(writer)?;
    let verdict = if report.validations.is_none() {
        let text = "NOT APPLICABLE";
        if use_colors { text.yellow().bold().to_string() } else { text.to_string() }
    } else if report.denied() {
        let text = "DENIED";
        if use_colors { text.red().bold().to_string() } else { text.to_string() }
    } else {
        let text = "ADMITTED";
        if use_colors { text.green().bold().to_string() } else { text.to_string() }
    };
    writeln!(writer, "Policy verdict: {verdict}")?;

    Ok(())
}

fn heading<W: Write>(writer: &mut W, title: &str, use_colors: bool) -> Result<()> {
    if use_colors {
        writeln!(writer, "{}", title.bold())?;
    } else {
        writeln!(writer, "{title}")?;
    }
    Ok(())
}

fn write_value_entry<W: Write>(writer: &mut W, entry: &ReportEntry) -> Result<()> {
    match (&entry.result, &entry.error) {
        (_, Some(error)) => writeln!(writer, "  {} failed: {error}", entry.name)?,
        (Some(value), None) => writeln!(writer, "  {} = {}", entry.name, format_value(value))?,
        (None, None) => writeln!(writer, "  {}", entry.name)?,
    }
    Ok(())
}

fn write_check_entry<W: Write>(writer: &mut W, entry: &ReportEntry, use_colors: bool) -> Result<()> {
    if entry.passed() {
        let mark = if use_colors { "✔️".green().to_string() } else { "✔️".to_string() };
        writeln!(writer, "  {mark} {}", entry.name)?;
        return Ok(());
    }

    let mark = if use_colors { "🗙".red().to_string() } else { "🗙".to_string() };
    write!(writer, "  {mark} {}", entry.name)?;

    if let Some(error) = &entry.error {
        write!(writer, " failed: {error}")?;
    } else if let Some(value) = &entry.result
        && !value.is_boolean()
    {
        write!(writer, " = {}", format_value(value))?;
    }

    if let Some(message) = &entry.message {
        write!(writer, " ({})", format_value(message))?;
    }

    writeln!(writer)?;
    Ok(())
}

/// Strings are shown bare, everything else as compact JSON.
fn format_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
