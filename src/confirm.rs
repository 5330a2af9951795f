//! Confirmation before mutating calls
//!
//! [`decide`] holds the policy; [`confirm`] is the terminal shell around it.

use anyhow::{Context, Result};
use std::io::{BufRead, IsTerminal, Write};

use crate::exec::ExecError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Prompt,
    Abort,
}

/// Decide whether to go ahead, ask, or refuse
pub fn decide(auto_confirm: bool, dry_run: bool, interactive: bool) -> Decision {
    if dry_run || auto_confirm {
        Decision::Proceed
    } else if interactive {
        Decision::Prompt
    } else {
        Decision::Abort
    }
}

/// Only an explicit yes counts
pub fn parse_answer(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Ask on stderr and read one line from `input`
pub fn prompt(question: &str, input: &mut impl BufRead) -> Result<bool> {
    eprint!("{question} [y/N] ");
    std::io::stderr().flush().ok();
    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(parse_answer(&answer))
}

/// Confirm a mutating action, failing with a cancellation error on "no"
#[cfg(not(tarpaulin_include))]
pub fn confirm(question: &str, auto_confirm: bool, dry_run: bool) -> Result<()> {
    let stdin = std::io::stdin();
    let proceed = match decide(auto_confirm, dry_run, stdin.is_terminal()) {
        Decision::Proceed => true,
        Decision::Prompt => prompt(question, &mut stdin.lock())?,
        Decision::Abort => {
            return Err(ExecError::InvalidParameter(
                "confirmation required; pass -y/--yes or set AUTO_CONFIRM=true".to_string(),
            )
            .into())
        }
    };

    if proceed {
        Ok(())
    } else {
        anyhow::bail!("Cancelled by user")
    }
}
