use anyhow::{Context, Result};
use comfy_table::{Cell, Color};
use owo_colors::{OwoColorize, Stream};

use super::service::AuthStatus;
use super::types::ProfileConfig;
use crate::ui::new_table;

fn field(label: &str, value: &str) {
    println!(
        "  {} {}",
        format!("{label:<9}").if_supports_color(Stream::Stdout, |t| t.dimmed()),
        value
    );
}

pub fn output_status(status: &AuthStatus, json: bool) -> Result<()> {
    if json {
        let json = serde_json::to_string_pretty(status).context("Failed to serialize status")?;
        println!("{json}");
        return Ok(());
    }

    let ctx = &status.context;
    println!("{}", "AWS Auth".if_supports_color(Stream::Stdout, |t| t.bold()));
    field("Method:", ctx.method.as_str());
    field("Profile:", ctx.profile.as_deref().unwrap_or("-"));
    field("Region:", ctx.region.as_deref().unwrap_or("-"));
    field("Source:", &ctx.source);

    if let Some(identity) = &status.identity {
        field("Account:", &identity.account);
        field("Type:", identity.type_name());
        field("Name:", identity.name());
        field("ARN:", &identity.arn);
    }
    Ok(())
}

pub fn format_profiles(profiles: &[ProfileConfig], current: Option<&str>, color: bool) -> String {
    if profiles.is_empty() {
        return "No profiles found in ~/.aws/config or ~/.aws/credentials.".to_string();
    }

    let mut table = new_table(color);
    table.set_header(vec!["", "PROFILE", "METHOD", "REGION", "DETAIL"]);

    for profile in profiles {
        let active = current == Some(profile.name.as_str());
        let detail = profile
            .role_arn
            .as_deref()
            .or(profile.sso_session.as_deref())
            .or(profile.sso_start_url.as_deref())
            .or(profile.web_identity_token_file.as_deref())
            .unwrap_or(if profile.has_static_keys { "static keys" } else { "-" });

        let name = Cell::new(&profile.name);
        table.add_row(vec![
            Cell::new(if active { "*" } else { "" }).fg(Color::Green),
            if active { name.fg(Color::Green) } else { name.fg(Color::Cyan) },
            Cell::new(profile.method()),
            Cell::new(profile.region.as_deref().unwrap_or("-")),
            Cell::new(detail),
        ]);
    }

    table.to_string()
}

pub fn output_profiles(
    profiles: &[ProfileConfig],
    current: Option<&str>,
    json: bool,
    color: bool,
) -> Result<()> {
    if json {
        let json = serde_json::to_string_pretty(profiles).context("Failed to serialize profiles")?;
        println!("{json}");
    } else {
        println!("{}", format_profiles(profiles, current, color));
    }
    Ok(())
}
