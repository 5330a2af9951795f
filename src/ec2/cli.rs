use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum Ec2Command {
    /// Describe instances (all of them when no ids are given)
    #[command(alias = "ls")]
    Describe {
        /// Instance ids (i-...)
        ids: Vec<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Start stopped instances
    Start {
        /// Instance ids (i-...)
        #[arg(required = true)]
        ids: Vec<String>,

        /// Wait until every instance is running
        #[arg(short, long)]
        wait: bool,

        /// Skip confirmation
        #[arg(short = 'y', long)]
        yes: bool,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Stop running instances
    Stop {
        /// Instance ids (i-...)
        #[arg(required = true)]
        ids: Vec<String>,

        /// Wait until every instance is stopped
        #[arg(short, long)]
        wait: bool,

        /// Force the instances to stop
        #[arg(long)]
        force: bool,

        /// Skip confirmation
        #[arg(short = 'y', long)]
        yes: bool,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}
