//! AWS CLI boundary
//!
//! Every remote call goes through an [`AwsRunner`]; [`AwsClient`] wraps the
//! runner with the retrying invoker and dry-run handling.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tracing::debug;

use crate::config::AppConfig;
use crate::exec::{Envelope, Invoker, Pause, RawFailure, RawOutput, RawResult, TokioPause};
use crate::ui;

#[cfg(test)]
pub mod mock;
#[cfg(test)]
mod tests;

/// Exit status reported for an attempt cut off by the timeout
pub const TIMEOUT_STATUS: i32 = 124;
/// Exit status reported when the aws binary is missing
pub const NOT_FOUND_STATUS: i32 = 127;

/// Profile and region appended to every call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwsContext {
    pub profile: Option<String>,
    pub region: Option<String>,
}

impl From<&AppConfig> for AwsContext {
    fn from(config: &AppConfig) -> Self {
        Self {
            profile: config.profile.clone(),
            region: config.region.clone(),
        }
    }
}

/// One `aws <service> <verb> ...` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsCall {
    pub service: String,
    pub verb: String,
    pub args: Vec<String>,
}

impl AwsCall {
    pub fn new(service: &str, verb: &str) -> Self {
        Self {
            service: service.to_string(),
            verb: verb.to_string(),
            args: Vec::new(),
        }
    }

    /// Append `--name value`
    pub fn opt(mut self, name: &str, value: impl Into<String>) -> Self {
        self.args.push(name.to_string());
        self.args.push(value.into());
        self
    }

    /// Append a bare argument
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Append several bare arguments
    pub fn args<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(values.into_iter().map(Into::into));
        self
    }

    /// Full argument vector for the aws binary
    pub fn to_args(&self, ctx: &AwsContext) -> Vec<String> {
        let mut args = vec![self.service.clone(), self.verb.clone()];
        args.extend(self.args.iter().cloned());
        args.push("--output".to_string());
        args.push("json".to_string());

        if let Some(profile) = &ctx.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }

        if let Some(region) = &ctx.region {
            args.push("--region".to_string());
            args.push(region.clone());
        }

        args
    }

    /// Shell-style rendering, for logs and dry-run output
    pub fn display(&self, ctx: &AwsContext) -> String {
        let mut parts = vec!["aws".to_string()];
        parts.extend(self.to_args(ctx).iter().map(|a| shell_quote(a)));
        parts.join(" ")
    }
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,@+".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Executes calls against the real service (or a test double)
pub trait AwsRunner {
    /// Run a call, capturing its output
    fn run(&self, call: &AwsCall) -> impl Future<Output = RawResult>;

    /// Run a call attached to the terminal (e.g. `sso login`)
    fn run_interactive(&self, call: &AwsCall) -> impl Future<Output = Result<()>>;
}

/// Runs the `aws` binary, one attempt bounded by `timeout`
pub struct AwsCli {
    ctx: AwsContext,
    timeout: Duration,
}

impl AwsCli {
    pub fn new(ctx: AwsContext, timeout: Duration) -> Self {
        Self { ctx, timeout }
    }
}

#[cfg(not(tarpaulin_include))]
impl AwsRunner for AwsCli {
    async fn run(&self, call: &AwsCall) -> RawResult {
        let args = call.to_args(&self.ctx);
        debug!(command = %call.display(&self.ctx), "running aws cli");

        let mut cmd = tokio::process::Command::new("aws");
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Err(_) => {
                return Err(RawFailure::new(
                    format!(
                        "timeout: aws {} {} did not finish within {}s",
                        call.service,
                        call.verb,
                        self.timeout.as_secs()
                    ),
                    TIMEOUT_STATUS,
                ))
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RawFailure::new(
                    "aws cli not found. Is AWS CLI installed and on PATH?",
                    NOT_FOUND_STATUS,
                ))
            }
            Ok(Err(e)) => {
                return Err(RawFailure::new(
                    format!("Failed to execute aws cli: {e}"),
                    1,
                ))
            }
            Ok(Ok(output)) => output,
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if output.status.success() {
            return Ok(RawOutput::new(stdout));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let text = if stderr.trim().is_empty() {
            stdout
        } else {
            stderr.to_string()
        };
        Err(RawFailure::new(text, output.status.code().unwrap_or(1)))
    }

    async fn run_interactive(&self, call: &AwsCall) -> Result<()> {
        let mut args = vec![call.service.clone(), call.verb.clone()];
        args.extend(call.args.iter().cloned());
        if let Some(profile) = &self.ctx.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }

        let status = tokio::process::Command::new("aws")
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .with_context(|| format!("Failed to run aws {} {}", call.service, call.verb))?;

        if !status.success() {
            anyhow::bail!("aws {} {} exited with status: {}", call.service, call.verb, status);
        }
        Ok(())
    }
}

/// Runner plus retry policy plus dry-run switch
pub struct AwsClient<R = AwsCli, P = TokioPause> {
    runner: R,
    invoker: Invoker<P>,
    ctx: AwsContext,
    dry_run: bool,
}

impl AwsClient {
    pub fn from_config(config: &AppConfig) -> Self {
        let ctx = AwsContext::from(config);
        Self {
            runner: AwsCli::new(ctx.clone(), config.retry.timeout),
            invoker: Invoker::new(config.retry),
            ctx,
            dry_run: config.dry_run,
        }
    }
}

impl<R: AwsRunner, P: Pause> AwsClient<R, P> {
    #[cfg(test)]
    pub fn new(runner: R, invoker: Invoker<P>, ctx: AwsContext, dry_run: bool) -> Self {
        Self {
            runner,
            invoker,
            ctx,
            dry_run,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    #[cfg(test)]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Pause shared with the retry loop, for polling
    pub fn pause(&self) -> &P {
        self.invoker.pause_handle()
    }

    /// Read-only call, executed even in dry-run mode
    pub async fn call(&self, call: &AwsCall, resource_type: &str) -> Envelope {
        self.invoker
            .invoke(&call.verb, resource_type, || self.runner.run(call))
            .await
    }

    /// Mutating call; in dry-run mode only the command is printed
    pub async fn mutate(&self, call: &AwsCall, resource_type: &str) -> Envelope {
        if self.dry_run {
            let command = call.display(&self.ctx);
            ui::print_dry_run(&command);
            return Envelope::success(
                &call.verb,
                resource_type,
                json!({ "DryRun": true, "Command": command }),
                None,
            );
        }
        self.call(call, resource_type).await
    }

    /// Terminal-attached call, never retried
    pub async fn interactive(&self, call: &AwsCall) -> Result<()> {
        if self.dry_run {
            ui::print_dry_run(&call.display(&self.ctx));
            return Ok(());
        }
        self.runner.run_interactive(call).await
    }
}

/// Per-operation scratch directory for `--cli-input-json` documents
///
/// Removed when dropped.
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("awstools-")
            .tempdir()
            .context("Failed to create temporary directory")?;
        Ok(Self { dir })
    }

    /// Write `value` as JSON and return its `file://` reference
    pub fn input_json(&self, name: &str, value: &impl Serialize) -> Result<String> {
        let path: PathBuf = self.dir.path().join(format!("{name}.json"));
        let body = serde_json::to_string_pretty(value).context("Failed to serialize input")?;
        std::fs::write(&path, body)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(format!("file://{}", path.display()))
    }

    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }
}
