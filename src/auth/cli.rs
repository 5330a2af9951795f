use clap::Subcommand;

use super::types::AuthMethod;

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Show the detected auth method and caller identity
    #[command(alias = "whoami")]
    Status {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// List profiles from ~/.aws/config and ~/.aws/credentials
    Profiles {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Switch credentials; prints export lines for `eval`
    ///
    /// The profile comes from the global --profile flag.
    Switch {
        /// Method to switch to
        #[arg(value_enum)]
        method: AuthMethod,

        /// Role to assume (assume-role, web-identity)
        #[arg(long)]
        role_arn: Option<String>,

        /// Session name for assumed roles
        #[arg(long)]
        session_name: Option<String>,
    },
}
