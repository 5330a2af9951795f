//! Switch handlers keyed by [`AuthMethod`]
//!
//! Handlers are plain functions that turn a [`SwitchRequest`] into a
//! [`SwitchPlan`]; the service executes the plan against the AWS CLI.

use chrono::Utc;
use std::collections::BTreeMap;

use super::types::{AuthMethod, ShellLine, SwitchRequest};
use crate::awscli::AwsCall;
use crate::exec::ExecError;

/// One remote step of a switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Terminal-attached call (`aws sso login`)
    Login(AwsCall),
    /// `sts get-caller-identity` to confirm credentials work
    Verify,
    /// STS call returning a `Credentials` object
    Credentials(AwsCall),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchPlan {
    pub method: AuthMethod,
    /// Profile the steps run under
    pub profile: Option<String>,
    pub steps: Vec<Step>,
    /// Shell lines known before any call is made
    pub lines: Vec<ShellLine>,
}

pub type Handler = fn(&SwitchRequest) -> Result<SwitchPlan, ExecError>;

const KEY_VARS: [&str; 3] = ["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY", "AWS_SESSION_TOKEN"];

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<AuthMethod, Handler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in handler
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(AuthMethod::Sso, sso);
        registry.register(AuthMethod::Profile, profile);
        registry.register(AuthMethod::AssumeRole, assume_role);
        registry.register(AuthMethod::WebIdentity, web_identity);
        registry.register(AuthMethod::InstanceProfile, instance_profile);
        registry
    }

    pub fn register(&mut self, method: AuthMethod, handler: Handler) {
        self.handlers.insert(method, handler);
    }

    pub fn methods(&self) -> Vec<AuthMethod> {
        self.handlers.keys().copied().collect()
    }

    pub fn handler(&self, method: AuthMethod) -> Result<Handler, ExecError> {
        self.handlers.get(&method).copied().ok_or_else(|| {
            let known: Vec<&str> = self.methods().iter().map(AuthMethod::as_str).collect();
            let known = if known.is_empty() {
                "none".to_string()
            } else {
                known.join(", ")
            };
            ExecError::Initialization(format!(
                "no switch handler registered for {method} (available: {known})"
            ))
        })
    }

    pub fn plan(&self, request: &SwitchRequest) -> Result<SwitchPlan, ExecError> {
        (self.handler(request.method)?)(request)
    }
}

fn required<'a>(value: &'a Option<String>, flag: &str, method: AuthMethod) -> Result<&'a str, ExecError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ExecError::InvalidParameter(format!("{flag} is required for {method}")))
}

fn session_name(request: &SwitchRequest) -> String {
    request
        .session_name
        .clone()
        .unwrap_or_else(|| format!("awstools-{}", Utc::now().timestamp()))
}

fn profile_lines(profile: &str) -> Vec<ShellLine> {
    let mut lines: Vec<ShellLine> = KEY_VARS.iter().map(|v| ShellLine::unset(v)).collect();
    lines.push(ShellLine::export("AWS_PROFILE", profile));
    lines
}

fn sso(request: &SwitchRequest) -> Result<SwitchPlan, ExecError> {
    let profile = required(&request.profile, "--profile", request.method)?;
    Ok(SwitchPlan {
        method: AuthMethod::Sso,
        profile: Some(profile.to_string()),
        steps: vec![Step::Login(AwsCall::new("sso", "login")), Step::Verify],
        lines: profile_lines(profile),
    })
}

fn profile(request: &SwitchRequest) -> Result<SwitchPlan, ExecError> {
    let profile = required(&request.profile, "--profile", request.method)?;
    Ok(SwitchPlan {
        method: AuthMethod::Profile,
        profile: Some(profile.to_string()),
        steps: vec![Step::Verify],
        lines: profile_lines(profile),
    })
}

fn assume_role(request: &SwitchRequest) -> Result<SwitchPlan, ExecError> {
    let role_arn = required(&request.role_arn, "--role-arn", request.method)?;
    let call = AwsCall::new("sts", "assume-role")
        .opt("--role-arn", role_arn)
        .opt("--role-session-name", session_name(request));
    Ok(SwitchPlan {
        method: AuthMethod::AssumeRole,
        profile: request.profile.clone(),
        steps: vec![Step::Credentials(call)],
        lines: Vec::new(),
    })
}

fn web_identity(request: &SwitchRequest) -> Result<SwitchPlan, ExecError> {
    let role_arn = required(&request.role_arn, "--role-arn", request.method)?;
    let token = required(
        &request.web_identity_token,
        "AWS_WEB_IDENTITY_TOKEN_FILE",
        request.method,
    )?;
    let call = AwsCall::new("sts", "assume-role-with-web-identity")
        .opt("--role-arn", role_arn)
        .opt("--role-session-name", session_name(request))
        .opt("--web-identity-token", token.trim());
    Ok(SwitchPlan {
        method: AuthMethod::WebIdentity,
        profile: None,
        steps: vec![Step::Credentials(call)],
        lines: Vec::new(),
    })
}

fn instance_profile(_request: &SwitchRequest) -> Result<SwitchPlan, ExecError> {
    let mut lines: Vec<ShellLine> = KEY_VARS.iter().map(|v| ShellLine::unset(v)).collect();
    lines.push(ShellLine::unset("AWS_PROFILE"));
    Ok(SwitchPlan {
        method: AuthMethod::InstanceProfile,
        profile: None,
        steps: vec![Step::Verify],
        lines,
    })
}
