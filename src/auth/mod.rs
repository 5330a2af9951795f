//! AWS authentication context
//!
//! Detect how the current environment authenticates, list profiles, and
//! switch between methods. A child process cannot change its parent's
//! environment, so `switch` prints shell lines to `eval`.

mod cli;
mod detect;
mod display;
mod registry;
mod service;
mod types;

use anyhow::Result;
use std::path::Path;

use crate::awscli::AwsClient;
use crate::config::{AppConfig, EnvSnapshot};
use crate::ui;

pub use cli::AuthCommand;
use registry::HandlerRegistry;
use types::{AuthMethod, ProfileConfig, SwitchRequest};

/// Run an auth command
pub async fn run(cmd: AuthCommand, config: &AppConfig) -> Result<()> {
    match cmd {
        AuthCommand::Status { json } => cmd_status(config, json).await,
        AuthCommand::Profiles { json } => cmd_profiles(config, json),
        AuthCommand::Switch {
            method,
            role_arn,
            session_name,
        } => cmd_switch(config, method, role_arn, session_name).await,
    }
}

/// Environment as seen through the resolved configuration
fn effective_env(config: &AppConfig) -> EnvSnapshot {
    let mut env = config.env.clone();
    if config.profile.is_some() {
        env.aws_profile = config.profile.clone();
    }
    if let Some(region) = &config.region {
        env.aws_region = Some(region.clone());
    }
    env
}

/// Show detected context and caller identity
pub async fn cmd_status(config: &AppConfig, json: bool) -> Result<()> {
    let profiles = detect::load_profiles()?;
    let context = detect::detect(&effective_env(config), &profiles);
    let client = AwsClient::from_config(config);

    let status = service::status(&client, context).await;
    display::output_status(&status, json)?;

    if !status.is_authenticated() {
        anyhow::bail!(
            "Not authenticated ({}): {}",
            status.context.method,
            status.error.as_deref().unwrap_or("no identity returned")
        );
    }
    Ok(())
}

fn cmd_profiles(config: &AppConfig, json: bool) -> Result<()> {
    let profiles = detect::load_profiles()?;
    let current = detect::detect(&effective_env(config), &profiles).profile;
    display::output_profiles(&profiles, current.as_deref(), json, config.color)
}

/// Build the switch request, filling gaps from the environment and profile
fn switch_request(
    config: &AppConfig,
    profiles: &[ProfileConfig],
    method: AuthMethod,
    role_arn: Option<String>,
    session_name: Option<String>,
) -> Result<SwitchRequest> {
    let selected = config
        .profile
        .as_deref()
        .and_then(|name| profiles.iter().find(|p| p.name == name));

    let mut request = SwitchRequest {
        method,
        profile: config.profile.clone(),
        role_arn,
        session_name,
        web_identity_token: None,
    };

    match method {
        AuthMethod::AssumeRole if request.role_arn.is_none() => {
            if let Some(profile) = selected {
                request.role_arn = profile.role_arn.clone();
                request.profile = profile.source_profile.clone();
            }
        }
        AuthMethod::WebIdentity => {
            request.role_arn = request
                .role_arn
                .or_else(|| config.env.role_arn.clone())
                .or_else(|| selected.and_then(|p| p.role_arn.clone()));
            let token_file = config
                .env
                .web_identity_token_file
                .clone()
                .or_else(|| selected.and_then(|p| p.web_identity_token_file.clone()));
            if let Some(path) = token_file {
                request.web_identity_token = Some(service::read_token(Path::new(&path))?);
            }
        }
        _ => {}
    }

    Ok(request)
}

async fn cmd_switch(
    config: &AppConfig,
    method: AuthMethod,
    role_arn: Option<String>,
    session_name: Option<String>,
) -> Result<()> {
    let profiles = detect::load_profiles()?;
    let request = switch_request(config, &profiles, method, role_arn, session_name)?;
    let plan = HandlerRegistry::with_defaults().plan(&request)?;

    let mut scoped = config.clone();
    scoped.profile = match plan.method {
        AuthMethod::InstanceProfile | AuthMethod::WebIdentity => None,
        _ => plan.profile.clone(),
    };
    let client = AwsClient::from_config(&scoped);

    let outcome = service::switch(&client, plan).await?;
    println!("{}", outcome.script());

    if let Some(identity) = &outcome.identity {
        ui::print_note(&format!(
            "{} as {} ({}) in {}",
            outcome.method,
            identity.name(),
            identity.type_name(),
            identity.account
        ));
    }
    if let Some(expiration) = &outcome.expiration {
        ui::print_note(&format!("Credentials expire at {expiration}"));
    }
    ui::print_note("Apply with: eval \"$(awstools auth switch ...)\"");
    Ok(())
}
