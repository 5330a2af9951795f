//! EC2 output formatting

use anyhow::{Context, Result};
use comfy_table::{Cell, Color};

use super::types::{Instance, InstanceState, OutputFormat, Transition, TransitionReport};
use crate::ui::new_table;

fn state_color(state: InstanceState) -> Color {
    match state {
        InstanceState::Running => Color::Green,
        InstanceState::Pending | InstanceState::Stopping => Color::Yellow,
        InstanceState::Stopped => Color::DarkGrey,
        InstanceState::ShuttingDown | InstanceState::Terminated => Color::Red,
        InstanceState::Unknown => Color::White,
    }
}

pub fn format_instances(instances: &[Instance], color: bool) -> String {
    if instances.is_empty() {
        return "No instances found.".to_string();
    }

    let mut table = new_table(color);
    table.set_header(vec![
        "ID",
        "NAME",
        "STATE",
        "TYPE",
        "PRIVATE IP",
        "PUBLIC IP",
        "LAUNCHED",
    ]);

    for i in instances {
        table.add_row(vec![
            Cell::new(&i.id).fg(Color::Cyan),
            Cell::new(i.name.as_deref().unwrap_or("-")),
            Cell::new(i.state).fg(state_color(i.state)),
            Cell::new(i.instance_type.as_deref().unwrap_or("-")),
            Cell::new(i.private_ip.as_deref().unwrap_or("-")),
            Cell::new(i.public_ip.as_deref().unwrap_or("-")),
            Cell::new(i.launch_time.as_deref().unwrap_or("-")),
        ]);
    }

    format!("{table}\n\n{} instances", instances.len())
}

pub fn format_report(report: &TransitionReport, color: bool) -> String {
    let mut table = new_table(color);
    table.set_header(vec!["ID", "NAME", "BEFORE", "ACTION", "AFTER"]);

    for item in &report.items {
        let action = match &item.transition {
            Transition::Blocked(reason) => Cell::new(format!("blocked: {reason}")).fg(Color::Red),
            other => Cell::new(other.label()),
        };
        let after = match item.after {
            Some(state) => Cell::new(state).fg(state_color(state)),
            None => Cell::new("-"),
        };
        table.add_row(vec![
            Cell::new(&item.id).fg(Color::Cyan),
            Cell::new(item.name.as_deref().unwrap_or("-")),
            Cell::new(item.before).fg(state_color(item.before)),
            action,
            after,
        ]);
    }

    table.to_string()
}

pub fn output_instances(instances: &[Instance], format: OutputFormat, color: bool) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", format_instances(instances, color)),
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(instances).context("Failed to serialize instances")?;
            println!("{json}");
        }
    }
    Ok(())
}

pub fn output_report(report: &TransitionReport, format: OutputFormat, color: bool) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", format_report(report, color)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
            println!("{json}");
        }
    }
    Ok(())
}
