//! Auth service layer - status and switching

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

use super::registry::{Step, SwitchPlan};
use super::types::{AuthContext, AuthMethod, Credentials, IdentityInfo, ShellLine};
use crate::awscli::{AwsCall, AwsClient, AwsRunner};
use crate::exec::{ExecError, Pause};


/// Caller identity for the client's credentials
pub async fn identity<R: AwsRunner, P: Pause>(
    client: &AwsClient<R, P>,
) -> Result<IdentityInfo, ExecError> {
    let payload = client
        .call(&AwsCall::new("sts", "get-caller-identity"), "identity")
        .await
        .into_result()?;
    IdentityInfo::from_response(&payload).ok_or_else(|| {
        ExecError::Initialization("get-caller-identity returned no Arn/Account".to_string())
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthStatus {
    pub context: AuthContext,
    pub identity: Option<IdentityInfo>,
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

/// Detected context plus whoever the credentials resolve to
pub async fn status<R: AwsRunner, P: Pause>(
    client: &AwsClient<R, P>,
    context: AuthContext,
) -> AuthStatus {
    match identity(client).await {
        Ok(identity) => AuthStatus {
            context,
            identity: Some(identity),
            error: None,
        },
        Err(e) => {
            debug!("identity check failed: {e}");
            AuthStatus {
                context,
                identity: None,
                error: Some(e.to_string()),
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SwitchOutcome {
    pub method: AuthMethod,
    pub identity: Option<IdentityInfo>,
    pub lines: Vec<ShellLine>,
    pub expiration: Option<String>,
}

impl SwitchOutcome {
    /// Lines for `eval "$(awstools auth switch ...)"`
    pub fn script(&self) -> String {
        self.lines
            .iter()
            .map(ShellLine::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Run a switch plan's steps in order
pub async fn switch<R: AwsRunner, P: Pause>(
    client: &AwsClient<R, P>,
    plan: SwitchPlan,
) -> Result<SwitchOutcome> {
    let mut outcome = SwitchOutcome {
        method: plan.method,
        identity: None,
        lines: plan.lines,
        expiration: None,
    };

    for step in &plan.steps {
        match step {
            Step::Login(call) => client
                .interactive(call)
                .await
                .with_context(|| format!("{} login failed", plan.method))?,
            Step::Verify => {
                let who = identity(client)
                    .await
                    .with_context(|| format!("Could not verify {} credentials", plan.method))?;
                outcome.identity = Some(who);
            }
            Step::Credentials(call) => {
                let payload = client
                    .call(call, "credentials")
                    .await
                    .into_result()
                    .with_context(|| format!("aws {} {} failed", call.service, call.verb))?;

                let creds = Credentials::from_response(&payload)
                    .with_context(|| format!("{} returned no Credentials", call.verb))?;
                outcome.lines.extend(creds.exports());
                outcome.expiration = creds.expiration;
                if let Some(who) = payload.get("AssumedRoleUser").and_then(|u| u.get("Arn")) {
                    if let Some(arn) = who.as_str() {
                        let account = arn.split(':').nth(4).unwrap_or_default();
                        outcome.identity = Some(IdentityInfo::from_arn(arn, account));
                    }
                }
            }
        }
    }

    Ok(outcome)
}

/// Contents of a web identity token file
pub fn read_token(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read web identity token {}", path.display()))
}
