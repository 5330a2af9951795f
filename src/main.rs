mod auth;
mod awscli;
mod cli;
mod config;
mod confirm;
mod ec2;
mod exec;
mod logging;
mod quicksight;
mod resource;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use owo_colors::{OwoColorize, Stream};

use cli::{Cli, Command};
use config::{AppConfig, EnvSnapshot};
use exec::ExecError;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        ui::print_error(&format!("Error: {e:#}"));
        std::process::exit(exit_code(&e));
    }
}

/// Typed errors choose the exit code; anything else is 1
fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<ExecError>()
        .map_or(1, ExecError::exit_code)
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let settings = config::load_settings()?;
    let config = AppConfig::resolve(settings, EnvSnapshot::capture(), cli.global.into());
    if !config.color {
        owo_colors::set_override(false);
    }
    logging::init(&config)?;
    tracing::debug!(
        profile = ?config.profile,
        region = ?config.region,
        dry_run = config.dry_run,
        "resolved configuration"
    );

    dispatch(command, &config).await
}

async fn dispatch(command: Command, config: &AppConfig) -> Result<()> {
    match command {
        Command::QuickSight { cmd } => match cmd {
            Some(cmd) => quicksight::run(cmd, config).await,
            None => print_subcommand_help("quicksight"),
        },
        Command::Ec2 { cmd } => match cmd {
            Some(cmd) => ec2::run(cmd, config).await,
            None => print_subcommand_help("ec2"),
        },
        Command::Auth { cmd } => match cmd {
            Some(cmd) => auth::run(cmd, config).await,
            None => print_subcommand_help("auth"),
        },
        Command::Config { init } => cmd_config(config, init),
        Command::Status { json } => auth::cmd_status(config, json).await,
    }
}

fn print_subcommand_help(name: &str) -> Result<()> {
    let mut cmd = Cli::command();
    if let Some(sub) = cmd.find_subcommand_mut(name) {
        sub.print_help()?;
    }
    Ok(())
}

fn cmd_config(config: &AppConfig, init: bool) -> Result<()> {
    let path = config::settings_path()?;

    if init {
        if config::init_settings_file(&path)? {
            ui::print_success(&format!("Wrote default settings to {}", path.display()));
        } else {
            ui::print_info(&format!("{} already exists", path.display()));
        }
        return Ok(());
    }

    let state = if path.exists() { "" } else { " (not found, using defaults)" };
    println!(
        "{} {}{state}",
        "Settings:".if_supports_color(Stream::Stdout, |t| t.dimmed()),
        path.display()
    );
    for (label, value) in config.summary() {
        println!(
            "  {} {value}",
            format!("{label:<13}").if_supports_color(Stream::Stdout, |t| t.dimmed())
        );
    }
    Ok(())
}
