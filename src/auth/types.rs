use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;

/// How credentials are obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMethod {
    /// IAM Identity Center (`sso_start_url` / `sso_session`)
    Sso,
    /// Named profile with static keys
    Profile,
    /// Profile with `role_arn`, or an explicit role to assume
    AssumeRole,
    /// OIDC token file exchanged for role credentials
    WebIdentity,
    /// EC2/ECS instance metadata credentials
    InstanceProfile,
    /// `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`
    Environment,
    /// Environment keys plus `AWS_SESSION_TOKEN`
    Session,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Sso => "sso",
            AuthMethod::Profile => "profile",
            AuthMethod::AssumeRole => "assume-role",
            AuthMethod::WebIdentity => "web-identity",
            AuthMethod::InstanceProfile => "instance-profile",
            AuthMethod::Environment => "environment",
            AuthMethod::Session => "session",
        }
    }
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One profile merged from `~/.aws/config` and `~/.aws/credentials`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileConfig {
    pub name: String,
    pub region: Option<String>,
    pub sso_start_url: Option<String>,
    pub sso_session: Option<String>,
    pub role_arn: Option<String>,
    pub source_profile: Option<String>,
    pub web_identity_token_file: Option<String>,
    pub has_static_keys: bool,
}

impl ProfileConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Method implied by the profile's keys
    pub fn method(&self) -> AuthMethod {
        if self.sso_start_url.is_some() || self.sso_session.is_some() {
            AuthMethod::Sso
        } else if self.role_arn.is_some() {
            AuthMethod::AssumeRole
        } else if self.web_identity_token_file.is_some() {
            AuthMethod::WebIdentity
        } else {
            AuthMethod::Profile
        }
    }
}

/// Detected authentication context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthContext {
    pub method: AuthMethod,
    pub profile: Option<String>,
    pub region: Option<String>,
    /// Where the method was detected from
    pub source: String,
}

// ==================== Identity ====================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum IdentityType {
    User(String),
    AssumedRole(String),
    FederatedUser(String),
    Root,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityInfo {
    pub account: String,
    pub arn: String,
    pub identity_type: IdentityType,
}

impl IdentityInfo {
    pub fn from_arn(arn: &str, account: &str) -> Self {
        let after = |marker: &str| arn.split_once(marker).map(|(_, rest)| rest);

        let identity_type = if let Some(name) = after(":user/") {
            IdentityType::User(name.to_string())
        } else if let Some(rest) = after(":assumed-role/") {
            let role = rest.split('/').next().unwrap_or("unknown");
            IdentityType::AssumedRole(role.to_string())
        } else if let Some(name) = after(":federated-user/") {
            IdentityType::FederatedUser(name.to_string())
        } else if arn.ends_with(":root") {
            IdentityType::Root
        } else {
            IdentityType::Unknown
        };

        Self {
            account: account.to_string(),
            arn: arn.to_string(),
            identity_type,
        }
    }

    /// From a `sts get-caller-identity` response
    pub fn from_response(value: &Value) -> Option<Self> {
        let arn = value.get("Arn")?.as_str()?;
        let account = value.get("Account")?.as_str()?;
        Some(Self::from_arn(arn, account))
    }

    pub fn type_name(&self) -> &str {
        match &self.identity_type {
            IdentityType::User(_) => "IAM User",
            IdentityType::AssumedRole(_) => "Assumed Role",
            IdentityType::FederatedUser(_) => "Federated User",
            IdentityType::Root => "Root",
            IdentityType::Unknown => "Unknown",
        }
    }

    pub fn name(&self) -> &str {
        match &self.identity_type {
            IdentityType::User(n) | IdentityType::AssumedRole(n) | IdentityType::FederatedUser(n) => n,
            IdentityType::Root => "root",
            IdentityType::Unknown => "unknown",
        }
    }
}

// ==================== Switching ====================

/// What `auth switch` was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchRequest {
    pub method: AuthMethod,
    pub profile: Option<String>,
    pub role_arn: Option<String>,
    pub session_name: Option<String>,
    /// Contents of the web identity token file
    pub web_identity_token: Option<String>,
}

/// Shell line emitted for `eval`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ShellLine {
    Export(String, String),
    Unset(String),
}

impl ShellLine {
    pub fn export(name: &str, value: impl Into<String>) -> Self {
        ShellLine::Export(name.to_string(), value.into())
    }

    pub fn unset(name: &str) -> Self {
        ShellLine::Unset(name.to_string())
    }

    pub fn render(&self) -> String {
        match self {
            ShellLine::Export(name, value) => {
                format!("export {name}='{}'", value.replace('\'', r"'\''"))
            }
            ShellLine::Unset(name) => format!("unset {name}"),
        }
    }
}

/// Temporary credentials from an STS response (`Credentials` object)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: Option<String>,
}

impl Credentials {
    pub fn from_response(value: &Value) -> Option<Self> {
        let creds = value.get("Credentials")?;
        let field = |name: &str| creds.get(name).and_then(Value::as_str).map(str::to_string);
        Some(Self {
            access_key_id: field("AccessKeyId")?,
            secret_access_key: field("SecretAccessKey")?,
            session_token: field("SessionToken")?,
            expiration: field("Expiration"),
        })
    }

    pub fn exports(&self) -> Vec<ShellLine> {
        vec![
            ShellLine::unset("AWS_PROFILE"),
            ShellLine::export("AWS_ACCESS_KEY_ID", &self.access_key_id),
            ShellLine::export("AWS_SECRET_ACCESS_KEY", &self.secret_access_key),
            ShellLine::export("AWS_SESSION_TOKEN", &self.session_token),
        ]
    }
}
