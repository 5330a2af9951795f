//! QuickSight output formatting

use anyhow::{Context, Result};
use comfy_table::{Cell, Color};

use super::types::{BackupReport, OutputFormat, RestoreItem, Summary};
use crate::ui::new_table;

fn status_color(status: &str) -> Color {
    match status {
        s if s.ends_with("_SUCCESSFUL") => Color::Green,
        s if s.ends_with("_IN_PROGRESS") => Color::Yellow,
        s if s.ends_with("_FAILED") => Color::Red,
        "SPICE" => Color::Magenta,
        "DIRECT_QUERY" => Color::Blue,
        _ => Color::White,
    }
}

/// Table of list summaries
pub fn format_summaries(summaries: &[Summary], color: bool) -> String {
    if summaries.is_empty() {
        return "No resources found.".to_string();
    }

    let mut table = new_table(color);
    table.set_header(vec!["ID", "NAME", "STATUS", "UPDATED"]);

    for summary in summaries {
        let status = summary.status.as_deref().unwrap_or("-");
        table.add_row(vec![
            Cell::new(&summary.id).fg(Color::Cyan),
            Cell::new(&summary.name),
            Cell::new(status).fg(status_color(status)),
            Cell::new(summary.last_updated.as_deref().unwrap_or("-")),
        ]);
    }

    format!("{table}\n\n{} found", summaries.len())
}

pub fn output_summaries(summaries: &[Summary], format: OutputFormat, color: bool) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", format_summaries(summaries, color)),
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(summaries).context("Failed to serialize summaries")?;
            println!("{json}");
        }
    }
    Ok(())
}

/// Per-item backup results; only failures get a row
pub fn format_backup(report: &BackupReport, color: bool) -> String {
    let mut out = format!(
        "{}: {} backed up, {} failed -> {}",
        report.kind,
        report.succeeded(),
        report.failed(),
        report.root.display()
    );

    if report.failed() > 0 {
        let mut table = new_table(color);
        table.set_header(vec!["ID", "NAME", "ERROR"]);
        for item in report.items.iter().filter(|i| i.error.is_some()) {
            table.add_row(vec![
                Cell::new(&item.id).fg(Color::Cyan),
                Cell::new(&item.name),
                Cell::new(item.error.as_deref().unwrap_or_default()).fg(Color::Red),
            ]);
        }
        out.push('\n');
        out.push_str(&table.to_string());
    }

    out
}

pub fn format_restore(items: &[RestoreItem], color: bool) -> String {
    let mut table = new_table(color);
    table.set_header(vec!["FILE", "ID", "OPERATION", "PERMISSIONS", "RESULT"]);

    for item in items {
        let file = item
            .source
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let (result, fg) = match &item.error {
            Some(e) => (format!("✗ {e}"), Color::Red),
            None => ("✓".to_string(), Color::Green),
        };
        table.add_row(vec![
            Cell::new(file),
            Cell::new(item.id.as_deref().unwrap_or("-")).fg(Color::Cyan),
            Cell::new(item.operation.as_deref().unwrap_or("-")),
            Cell::new(if item.permissions_applied { "applied" } else { "-" }),
            Cell::new(result).fg(fg),
        ]);
    }

    let failed = items.iter().filter(|i| i.error.is_some()).count();
    format!(
        "{table}\n\n{} restored, {} failed",
        items.len() - failed,
        failed
    )
}

pub fn output_backup(reports: &[BackupReport], format: OutputFormat, color: bool) -> Result<()> {
    match format {
        OutputFormat::Table => {
            for report in reports {
                println!("{}", format_backup(report, color));
            }
        }
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(reports).context("Failed to serialize report")?;
            println!("{json}");
        }
    }
    Ok(())
}

pub fn output_restore(items: &[RestoreItem], format: OutputFormat, color: bool) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", format_restore(items, color)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).context("Failed to serialize report")?;
            println!("{json}");
        }
    }
    Ok(())
}
