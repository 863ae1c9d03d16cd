use std::io::{self, Write};

use colored::Colorize;
use esmify_transform::ExportPlan;
use log::debug;

use crate::types::{ConvertResult, FileReport, FileStatus};

fn plan_label(plan: &ExportPlan) -> String {
    match plan {
        ExportPlan::None => String::new(),
        ExportPlan::Wrapper { .. } => "wrapper".to_string(),
        ExportPlan::ObjectSplit => "object split".to_string(),
        ExportPlan::DefaultDirect => "default export".to_string(),
        ExportPlan::DefaultMutable { .. } => "mutable default export".to_string(),
        ExportPlan::Named { strategies } => format!("{} named exports", strategies.len()),
    }
}

fn print_file<W: Write>(writer: &mut W, report: &FileReport) -> io::Result<()> {
    let path = report.path.display().to_string();
    match &report.status {
        FileStatus::Converted => {
            let plan = report.export_plan.as_ref().map(plan_label).unwrap_or_default();
            if plan.is_empty() {
                writeln!(writer, "{} {}", "✓".green().bold(), path.bright_white())?;
            } else {
                writeln!(
                    writer,
                    "{} {} ({})",
                    "✓".green().bold(),
                    path.bright_white(),
                    plan.dimmed()
                )?;
            }
            if let Some(target) = &report.written_to {
                let target = target.display().to_string();
                writeln!(writer, "{}  {}", "└──".dimmed(), target.blue())?;
            }
        }
        FileStatus::Unchanged => writeln!(writer, "{} {}", "·".dimmed(), path.dimmed())?,
        FileStatus::Failed { error } => {
            writeln!(writer, "{} {}", "✗".red().bold(), path.bright_white())?;
            writeln!(writer, "{}  {}", "└──".dimmed(), error.red())?;
        }
    }

    for (idx, warning) in report.warnings.iter().enumerate() {
        let prefix = if idx == report.warnings.len() - 1 { "└──" } else { "├──" };
        writeln!(
            writer,
            "{}  {} {}:{}:{} {}",
            prefix.dimmed(),
            "⚠".yellow(),
            path,
            warning.line,
            warning.column,
            warning.message.yellow()
        )?;
    }
    Ok(())
}

/// Prints one line per file, followed by its destination, error or warnings.
pub fn print_report<W: Write>(writer: &mut W, result: &ConvertResult) -> io::Result<()> {
    debug!("Printing report for {} files", result.files.len());
    for report in &result.files {
        print_file(writer, report)?;
    }
    writer.flush()
}

/// Prints the converted code of every file that was not written to disk.
pub fn print_converted_code<W: Write>(writer: &mut W, result: &ConvertResult) -> io::Result<()> {
    for report in &result.files {
        if let Some(code) = &report.code {
            writeln!(writer, "{}", format!("// {}", report.path.display()).dimmed())?;
            writeln!(writer, "{}", code.trim_end())?;
            writeln!(writer)?;
        }
    }
    writer.flush()
}

pub fn print_json<W: Write>(writer: &mut W, result: &ConvertResult) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, result)?;
    writeln!(writer)?;
    writer.flush()
}

pub fn print_summary<W: Write>(writer: &mut W, result: &ConvertResult) -> io::Result<()> {
    writeln!(writer, "{}", "─".repeat(60).dimmed())?;
    writeln!(writer, "{}", "Summary".bold())?;
    writeln!(writer, "  Converted: {}", result.converted().to_string().green().bold())?;
    writeln!(writer, "  Unchanged: {}", result.unchanged().to_string().dimmed())?;
    let failed = result.failed();
    if failed > 0 {
        writeln!(writer, "  Failed: {}", failed.to_string().red().bold())?;
    }
    let warnings = result.warnings();
    if warnings > 0 {
        writeln!(writer, "  Warnings: {}", warnings.to_string().yellow())?;
    }
    Ok(())
}
