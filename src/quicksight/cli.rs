use clap::Subcommand;
use std::path::PathBuf;

use super::types::{Kind, Target};
use crate::exec::WriteOperation;

#[derive(Debug, Subcommand)]
pub enum QuickSightCommand {
    /// List analyses or datasets
    #[command(alias = "ls")]
    List {
        /// What to list
        #[arg(value_enum)]
        kind: Kind,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Back up analyses and/or datasets to a directory
    Backup {
        /// What to back up
        #[arg(value_enum, default_value_t = Target::All)]
        target: Target,

        /// Backup directory (default from settings: quicksight-backup)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Also back up permissions
        #[arg(short, long)]
        permissions: bool,

        /// Output report as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Restore analyses and/or datasets from a backup
    Restore {
        /// Which kinds to restore from --dir
        #[arg(value_enum, default_value_t = Target::All)]
        target: Target,

        /// Single resource file to restore
        #[arg(short, long, conflicts_with = "dir")]
        file: Option<PathBuf>,

        /// Backup directory to restore from
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// How to write each resource
        #[arg(short, long, value_enum, default_value_t = WriteOperation::Upsert)]
        operation: WriteOperation,

        /// Re-apply saved permissions
        #[arg(short, long)]
        permissions: bool,

        /// Skip confirmation
        #[arg(short = 'y', long)]
        yes: bool,

        /// Output report as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Delete one analysis or dataset
    Delete {
        /// Resource kind
        #[arg(value_enum)]
        kind: Kind,

        /// Analysis or dataset id
        id: String,

        /// Skip confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },
}
