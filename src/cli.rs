use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::auth::AuthCommand;
use crate::config::Overrides;
use crate::ec2::Ec2Command;
use crate::quicksight::QuickSightCommand;

#[derive(Parser)]
#[command(name = "awstools")]
#[command(about = "AWS ops CLI: QuickSight backups, EC2 power, auth context", long_about = None)]
#[command(version)]
#[command(after_help = "\x1b[2mExamples:\x1b[0m
    awstools qs backup all -p                  \x1b[2m# Back up analyses + datasets with permissions\x1b[0m
    awstools qs restore -d backup/20240501-1000 \x1b[2m# Restore a backup (upsert)\x1b[0m
    awstools ec2 stop i-0123456789abcdef0 -w   \x1b[2m# Stop and wait\x1b[0m
    awstools auth status                       \x1b[2m# Detected auth method + identity\x1b[0m
    eval \"$(awstools --profile dev auth switch sso)\"")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// AWS profile
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// AWS region
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Print mutating commands instead of running them
    #[arg(long, global = true)]
    pub dry_run: bool,
}

impl From<GlobalArgs> for Overrides {
    fn from(args: GlobalArgs) -> Self {
        Self {
            profile: args.profile,
            region: args.region,
            debug: args.debug,
            no_color: args.no_color,
            log_file: args.log_file,
            dry_run: args.dry_run,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// QuickSight analyses and datasets (list, backup, restore, delete)
    #[command(name = "quicksight", alias = "qs")]
    QuickSight {
        #[command(subcommand)]
        cmd: Option<QuickSightCommand>,
    },

    /// EC2 instances (describe, start, stop)
    Ec2 {
        #[command(subcommand)]
        cmd: Option<Ec2Command>,
    },

    /// Authentication context (status, profiles, switch)
    Auth {
        #[command(subcommand)]
        cmd: Option<AuthCommand>,
    },

    /// Show effective configuration
    Config {
        /// Write the default settings file if missing
        #[arg(long)]
        init: bool,
    },

    /// Shortcut for `auth status`
    Status {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}
