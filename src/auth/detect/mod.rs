//! Authentication context detection
//!
//! Precedence: web identity token file, environment keys, named profile,
//! instance profile.

use anyhow::{Context, Result};
use std::path::Path;

use super::types::{AuthContext, AuthMethod, ProfileConfig};
use crate::config::EnvSnapshot;


/// `(section, [(key, value)])` in file order
type Sections = Vec<(String, Vec<(String, String)>)>;

/// Parse an AWS shared config/credentials file
fn parse_sections(content: &str) -> Sections {
    let mut sections: Sections = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            let name = line[1..line.len() - 1].trim().to_string();
            sections.push((name, Vec::new()));
        } else if let Some((key, value)) = line.split_once('=') {
            if let Some((_, entries)) = sections.last_mut() {
                entries.push((key.trim().to_string(), value.trim().to_string()));
            }
        }
    }

    sections
}

fn profile_mut<'a>(profiles: &'a mut Vec<ProfileConfig>, name: &str) -> &'a mut ProfileConfig {
    let index = match profiles.iter().position(|p| p.name == name) {
        Some(index) => index,
        None => {
            profiles.push(ProfileConfig::named(name));
            profiles.len() - 1
        }
    };
    &mut profiles[index]
}

/// Merge `~/.aws/config` and `~/.aws/credentials` contents into profiles
///
/// Config sections are `[default]` or `[profile NAME]`; credentials
/// sections are bare names. `[sso-session ...]` and other sections are
/// skipped.
pub fn parse_profiles(config: &str, credentials: &str) -> Vec<ProfileConfig> {
    let mut profiles = Vec::new();

    for (section, entries) in parse_sections(config) {
        let name = if section == "default" {
            "default"
        } else if let Some(name) = section.strip_prefix("profile ") {
            name.trim()
        } else {
            continue;
        };

        let profile = profile_mut(&mut profiles, name);
        for (key, value) in entries {
            match key.as_str() {
                "region" => profile.region = Some(value),
                "sso_start_url" => profile.sso_start_url = Some(value),
                "sso_session" => profile.sso_session = Some(value),
                "role_arn" => profile.role_arn = Some(value),
                "source_profile" => profile.source_profile = Some(value),
                "web_identity_token_file" => profile.web_identity_token_file = Some(value),
                "aws_access_key_id" => profile.has_static_keys = true,
                _ => {}
            }
        }
    }

    for (section, entries) in parse_sections(credentials) {
        let profile = profile_mut(&mut profiles, &section);
        if entries.iter().any(|(k, _)| k == "aws_access_key_id") {
            profile.has_static_keys = true;
        }
    }

    profiles
}

/// Read profiles from the user's `~/.aws` directory
#[cfg(not(tarpaulin_include))]
pub fn load_profiles() -> Result<Vec<ProfileConfig>> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    let aws_dir = home.join(".aws");
    load_profiles_from(&aws_dir.join("config"), &aws_dir.join("credentials"))
}

/// Missing files count as empty
pub fn load_profiles_from(config: &Path, credentials: &Path) -> Result<Vec<ProfileConfig>> {
    let read = |path: &Path| -> Result<String> {
        if !path.exists() {
            return Ok(String::new());
        }
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
    };
    Ok(parse_profiles(&read(config)?, &read(credentials)?))
}

/// Decide how the current process authenticates
pub fn detect(env: &EnvSnapshot, profiles: &[ProfileConfig]) -> AuthContext {
    let profile_name = env.aws_profile.clone();
    let selected = profiles
        .iter()
        .find(|p| Some(&p.name) == profile_name.as_ref())
        .or_else(|| {
            profile_name
                .is_none()
                .then(|| profiles.iter().find(|p| p.name == "default"))
                .flatten()
        });
    let region = env
        .region()
        .map(str::to_string)
        .or_else(|| selected.and_then(|p| p.region.clone()));

    let context = |method: AuthMethod, profile: Option<String>, source: &str| AuthContext {
        method,
        profile,
        region: region.clone(),
        source: source.to_string(),
    };

    if env.web_identity_token_file.is_some() {
        return context(AuthMethod::WebIdentity, None, "AWS_WEB_IDENTITY_TOKEN_FILE");
    }

    if env.access_key_id.is_some() && env.secret_access_key.is_some() {
        return if env.session_token.is_some() {
            context(AuthMethod::Session, None, "AWS_SESSION_TOKEN")
        } else {
            context(AuthMethod::Environment, None, "AWS_ACCESS_KEY_ID")
        };
    }

    if let Some(profile) = selected {
        let source = if profile_name.is_some() {
            "AWS_PROFILE"
        } else {
            "default profile"
        };
        return context(profile.method(), Some(profile.name.clone()), source);
    }

    if let Some(name) = profile_name {
        return context(AuthMethod::Profile, Some(name), "AWS_PROFILE (not in ~/.aws)");
    }

    context(AuthMethod::InstanceProfile, None, "instance metadata")
}
