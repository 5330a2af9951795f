//! QuickSight analyses and datasets
//!
//! List, back up to a directory, restore from it, and delete.

mod api;
mod backup;
mod cli;
mod display;
mod service;
mod types;

use anyhow::Result;
use chrono::Utc;
use std::path::PathBuf;

use crate::awscli::AwsClient;
use crate::config::AppConfig;
use crate::confirm::confirm;
use crate::exec::WriteOperation;
use crate::resource::ResourceId;
use crate::ui;

use api::QuickSight;
use backup::BackupLayout;
pub use cli::QuickSightCommand;
use types::{Kind, OutputFormat, Target};

/// Run a QuickSight command
pub async fn run(cmd: QuickSightCommand, config: &AppConfig) -> Result<()> {
    let client = AwsClient::from_config(config);
    match cmd {
        QuickSightCommand::List { kind, json } => cmd_list(&client, config, kind, json).await,
        QuickSightCommand::Backup {
            target,
            dir,
            permissions,
            json,
        } => cmd_backup(&client, config, target, dir, permissions, json).await,
        QuickSightCommand::Restore {
            target,
            file,
            dir,
            operation,
            permissions,
            yes,
            json,
        } => {
            let opts = RestoreOptions {
                target,
                file,
                dir,
                operation,
                permissions,
                yes,
                json,
            };
            cmd_restore(&client, config, opts).await
        }
        QuickSightCommand::Delete { kind, id, yes } => {
            cmd_delete(&client, config, kind, &id, yes).await
        }
    }
}

struct RestoreOptions {
    target: Target,
    file: Option<PathBuf>,
    dir: Option<PathBuf>,
    operation: WriteOperation,
    permissions: bool,
    yes: bool,
    json: bool,
}

/// Backup directory used when `--dir` is not given
fn default_backup_dir(config: &AppConfig) -> PathBuf {
    config
        .backup_dir
        .join(Utc::now().format("%Y%m%d-%H%M%S").to_string())
}

async fn cmd_list(client: &AwsClient, config: &AppConfig, kind: Kind, json: bool) -> Result<()> {
    let api = QuickSight::connect(client).await?;
    let summaries = service::list(&api, kind).await?;
    display::output_summaries(&summaries, OutputFormat::from_json_flag(json), config.color)
}

async fn cmd_backup(
    client: &AwsClient,
    config: &AppConfig,
    target: Target,
    dir: Option<PathBuf>,
    permissions: bool,
    json: bool,
) -> Result<()> {
    let api = QuickSight::connect(client).await?;
    let layout = BackupLayout::new(dir.unwrap_or_else(|| default_backup_dir(config)));
    if !json {
        ui::print_info(&format!(
            "Backing up {} from account {} to {}",
            target_label(target),
            api.account_id(),
            layout.root().display()
        ));
    }

    let mut reports = Vec::new();
    for kind in target.kinds() {
        reports.push(service::backup(&api, &layout, kind, permissions).await?);
    }
    display::output_backup(&reports, OutputFormat::from_json_flag(json), config.color)?;

    let failed: usize = reports.iter().map(|r| r.failed()).sum();
    if failed > 0 {
        anyhow::bail!("{failed} item(s) failed to back up");
    }
    if !json {
        ui::print_success(&format!("Backup written to {}", layout.root().display()));
    }
    Ok(())
}

async fn cmd_restore(client: &AwsClient, config: &AppConfig, opts: RestoreOptions) -> Result<()> {
    let sources = service::collect_sources(opts.file.as_deref(), opts.dir.as_deref(), opts.target)?;
    let api = QuickSight::connect(client).await?;

    confirm(
        &format!(
            "Restore {} file(s) into account {}?",
            sources.len(),
            api.account_id()
        ),
        opts.yes || config.auto_confirm,
        config.dry_run,
    )?;

    let items = service::restore(&api, &sources, opts.operation, opts.permissions).await?;
    display::output_restore(&items, OutputFormat::from_json_flag(opts.json), config.color)?;

    let failed = items.iter().filter(|i| i.error.is_some()).count();
    if failed > 0 {
        anyhow::bail!("{failed} item(s) failed to restore");
    }
    Ok(())
}

async fn cmd_delete(
    client: &AwsClient,
    config: &AppConfig,
    kind: Kind,
    id: &str,
    yes: bool,
) -> Result<()> {
    let id = ResourceId::parse(kind.resource_type(), id)?;
    let api = QuickSight::connect(client).await?;

    confirm(
        &format!("Delete {} {id}?", kind.resource_type()),
        yes || config.auto_confirm,
        config.dry_run,
    )?;

    service::delete(&api, kind, &id).await?;
    if !config.dry_run {
        ui::print_success(&format!("Deleted {} {id}", kind.resource_type()));
    }
    Ok(())
}

fn target_label(target: Target) -> String {
    target
        .kinds()
        .iter()
        .map(Kind::to_string)
        .collect::<Vec<_>>()
        .join(" and ")
}
