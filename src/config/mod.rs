//! Settings file, environment and flag resolution
//!
//! Precedence: defaults < settings.toml < environment < command-line flags.
//! The result is an immutable [`AppConfig`] built once at startup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::exec::RetryPolicy;

#[cfg(test)]
mod tests;

/// Default settings.toml content with all options commented out
pub const DEFAULT_SETTINGS: &str = r#"# awstools settings
# Location: ~/Library/Application Support/awstools/settings.toml (macOS)
#           ~/.config/awstools/settings.toml (Linux)

# ============================================================================
# AWS Configuration
# ============================================================================

[aws]
# Profile to use (overridden by AWS_PROFILE and --profile)
# profile = "default"

# Region to use (overridden by AWS_REGION / AWS_DEFAULT_REGION and --region)
# region = "us-east-1"

# ============================================================================
# Retry Configuration
# ============================================================================

[retry]
# Attempts per remote call, including the first
# max_attempts = 3

# Constant delay between attempts
# delay_secs = 2

# Per-attempt timeout
# timeout_secs = 120

# ============================================================================
# Logging Configuration
# ============================================================================

[logging]
# error, warn, info, debug or trace (overridden by LOG_LEVEL and --debug)
# level = "warn"

# Also write log lines to this file (overridden by LOG_FILE and --log-file)
# file = "/tmp/awstools.log"

# ============================================================================
# Backup Configuration
# ============================================================================

[backup]
# Default QuickSight backup directory
# dir = "quicksight-backup"
"#;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub aws: AwsSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub backup: BackupSettings,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsSettings {
    pub profile: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub delay_secs: u64,
    pub timeout_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_secs: 2,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupSettings {
    pub dir: PathBuf,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("quicksight-backup"),
        }
    }
}

/// Environment variables read once at startup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    pub aws_profile: Option<String>,
    pub aws_region: Option<String>,
    pub aws_default_region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub web_identity_token_file: Option<String>,
    pub role_arn: Option<String>,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
    pub auto_confirm: Option<String>,
    pub no_color: Option<String>,
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl EnvSnapshot {
    #[cfg(not(tarpaulin_include))]
    pub fn capture() -> Self {
        Self {
            aws_profile: var("AWS_PROFILE"),
            aws_region: var("AWS_REGION"),
            aws_default_region: var("AWS_DEFAULT_REGION"),
            access_key_id: var("AWS_ACCESS_KEY_ID"),
            secret_access_key: var("AWS_SECRET_ACCESS_KEY"),
            session_token: var("AWS_SESSION_TOKEN"),
            web_identity_token_file: var("AWS_WEB_IDENTITY_TOKEN_FILE"),
            role_arn: var("AWS_ROLE_ARN"),
            log_level: var("LOG_LEVEL"),
            log_file: var("LOG_FILE"),
            auto_confirm: var("AUTO_CONFIRM"),
            no_color: var("NO_COLOR"),
        }
    }

    /// Region from AWS_REGION, falling back to AWS_DEFAULT_REGION
    pub fn region(&self) -> Option<&str> {
        self.aws_region
            .as_deref()
            .or(self.aws_default_region.as_deref())
    }
}

/// Global command-line flags
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub profile: Option<String>,
    pub region: Option<String>,
    pub debug: bool,
    pub no_color: bool,
    pub log_file: Option<PathBuf>,
    pub dry_run: bool,
}

/// Resolved, read-only configuration passed to every command
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub profile: Option<String>,
    pub region: Option<String>,
    pub retry: RetryPolicy,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub color: bool,
    pub dry_run: bool,
    pub auto_confirm: bool,
    pub backup_dir: PathBuf,
    pub env: EnvSnapshot,
}

/// Interpret a boolean-ish environment value
pub fn truthy(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "y" | "on")
    )
}

impl AppConfig {
    pub fn resolve(settings: Settings, env: EnvSnapshot, flags: Overrides) -> Self {
        let profile = flags
            .profile
            .or_else(|| env.aws_profile.clone())
            .or(settings.aws.profile);

        let region = flags
            .region
            .or_else(|| env.region().map(str::to_string))
            .or(settings.aws.region);

        let log_level = if flags.debug {
            "debug".to_string()
        } else {
            env.log_level
                .clone()
                .or(settings.logging.level)
                .unwrap_or_else(|| "warn".to_string())
                .to_lowercase()
        };

        let log_file = flags
            .log_file
            .or_else(|| env.log_file.as_ref().map(PathBuf::from))
            .or(settings.logging.file);

        let retry = RetryPolicy {
            max_attempts: settings.retry.max_attempts.max(1),
            delay: Duration::from_secs(settings.retry.delay_secs),
            timeout: Duration::from_secs(settings.retry.timeout_secs.max(1)),
        };

        Self {
            profile,
            region,
            retry,
            log_level,
            log_file,
            color: !flags.no_color && env.no_color.is_none(),
            dry_run: flags.dry_run,
            auto_confirm: truthy(env.auto_confirm.as_deref()),
            backup_dir: settings.backup.dir,
            env,
        }
    }
}

impl AppConfig {
    /// `(label, value)` rows for `awstools config`
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        vec![
            ("profile", or_dash(&self.profile)),
            ("region", or_dash(&self.region)),
            ("max_attempts", self.retry.max_attempts.to_string()),
            ("retry_delay", format!("{}s", self.retry.delay.as_secs())),
            ("timeout", format!("{}s", self.retry.timeout.as_secs())),
            ("log_level", self.log_level.clone()),
            (
                "log_file",
                self.log_file
                    .as_ref()
                    .map_or_else(|| "-".to_string(), |p| p.display().to_string()),
            ),
            ("backup_dir", self.backup_dir.display().to_string()),
            ("auto_confirm", self.auto_confirm.to_string()),
            ("dry_run", self.dry_run.to_string()),
        ]
    }
}

/// Get the path to the settings file
pub fn settings_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join("awstools").join("settings.toml"))
}

/// Write the commented default settings file if none exists
pub fn init_settings_file(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }
    std::fs::write(path, DEFAULT_SETTINGS)
        .with_context(|| format!("Failed to write default settings to {:?}", path))?;
    Ok(true)
}

/// Load settings from a specific path; a missing file yields defaults
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {:?}", path))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load settings from the config dir
pub fn load_settings() -> Result<Settings> {
    load_settings_from(&settings_path()?)
}
