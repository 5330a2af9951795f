//! Status lines and table defaults

use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use owo_colors::{OwoColorize, Stream};

pub fn print_success(msg: &str) {
    println!(
        "{} {}",
        "✓".if_supports_color(Stream::Stdout, |t| t.green()),
        msg
    );
}

pub fn print_info(msg: &str) {
    println!(
        "{} {}",
        "→".if_supports_color(Stream::Stdout, |t| t.cyan()),
        msg
    );
}

/// Info line on stderr, for commands whose stdout is meant for `eval`
pub fn print_note(msg: &str) {
    eprintln!(
        "{} {}",
        "→".if_supports_color(Stream::Stderr, |t| t.cyan()),
        msg
    );
}

pub fn print_warning(msg: &str) {
    eprintln!(
        "{} {}",
        "!".if_supports_color(Stream::Stderr, |t| t.yellow()),
        msg
    );
}

pub fn print_error(msg: &str) {
    eprintln!(
        "{} {}",
        "✗".if_supports_color(Stream::Stderr, |t| t.red()),
        msg.if_supports_color(Stream::Stderr, |t| t.red())
    );
}

/// Dry-run notice for a command that was not executed
pub fn print_dry_run(command: &str) {
    println!(
        "{} {}",
        "[dry-run]".if_supports_color(Stream::Stdout, |t| t.yellow()),
        command
    );
}

/// Table with the shared preset; styling is dropped when color is off
pub fn new_table(color: bool) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    if !color {
        table.force_no_tty();
    }
    table
}
