//! EC2 instances
//!
//! Describe, start, and stop instances.

mod api;
mod cli;
mod display;
mod service;
mod types;

use anyhow::Result;

use crate::awscli::AwsClient;
use crate::config::AppConfig;
use crate::confirm::confirm;
use crate::resource::{ResourceId, ResourceType};
use crate::ui;

use api::Ec2;
pub use cli::Ec2Command;
use service::WaitPolicy;
use types::{OutputFormat, TargetState};

/// Run an EC2 command
pub async fn run(cmd: Ec2Command, config: &AppConfig) -> Result<()> {
    match cmd {
        Ec2Command::Describe { ids, json } => cmd_describe(config, &ids, json).await,
        Ec2Command::Start {
            ids,
            wait,
            yes,
            json,
        } => cmd_change(config, &ids, TargetState::Running, false, wait, yes, json).await,
        Ec2Command::Stop {
            ids,
            wait,
            force,
            yes,
            json,
        } => cmd_change(config, &ids, TargetState::Stopped, force, wait, yes, json).await,
    }
}

async fn cmd_describe(config: &AppConfig, ids: &[String], json: bool) -> Result<()> {
    let ids = ResourceId::parse_all(ResourceType::Instance, ids)?;
    let client = AwsClient::from_config(config);
    let api = Ec2::new(&client);

    let instances = service::describe(&api, &ids).await?;
    display::output_instances(&instances, OutputFormat::from_json_flag(json), config.color)
}

#[allow(clippy::too_many_arguments)]
async fn cmd_change(
    config: &AppConfig,
    ids: &[String],
    target: TargetState,
    force: bool,
    wait: bool,
    yes: bool,
    json: bool,
) -> Result<()> {
    let ids = ResourceId::parse_all(ResourceType::Instance, ids)?;
    let client = AwsClient::from_config(config);
    let api = Ec2::new(&client);

    let action = match target {
        TargetState::Running => "Start",
        TargetState::Stopped if force => "Force stop",
        TargetState::Stopped => "Stop",
    };
    let listed: Vec<String> = ids.iter().map(ResourceId::to_string).collect();
    confirm(
        &format!("{action} {}?", listed.join(", ")),
        yes || config.auto_confirm,
        config.dry_run,
    )?;

    let policy = wait.then(WaitPolicy::default);
    let report = service::change_state(&api, &ids, target, force, policy).await?;
    display::output_report(&report, OutputFormat::from_json_flag(json), config.color)?;

    let blocked = report.blocked();
    if blocked > 0 {
        anyhow::bail!("{blocked} instance(s) could not be moved to {}", target.state());
    }
    if !json && report.items.iter().all(|i| !i.transition.is_actionable()) {
        ui::print_warning(&format!("Nothing to do: all instances already {}", target.state()));
    }
    if report.waited && !json {
        ui::print_success(&format!("All instances are {}", target.state()));
    }
    Ok(())
}
