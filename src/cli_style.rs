/*!
 * CLI Style System
 *
 * Themed text, icons and tables for the command line front end.
 */

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use console::{style, StyledObject};

use crate::catalog::AstronomicalObject;
use crate::format::format_coordinates;
use crate::presence::{PresencePayload, Status};
use crate::settings::SessionCredentials;

// ============================================================================
// THEME COLORS
// ============================================================================

/// Brand colors for consistent styling
pub struct Theme;

impl Theme {
    /// Primary accent color (cyan/blue)
    pub fn primary<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).cyan()
    }

    pub fn success<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).green()
    }

    pub fn warning<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).yellow()
    }

    pub fn error<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).red()
    }

    /// Muted/secondary text (dim)
    pub fn muted<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).dim()
    }

    /// Header style (bold cyan)
    pub fn header<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).cyan().bold()
    }

    /// Status code colored by severity
    pub fn status(status: Status) -> StyledObject<&'static str> {
        let code = status.code();
        match status {
            Status::Active => style(code).green().bold(),
            Status::ConnectingRpc | Status::Restarting => style(code).cyan(),
            Status::SearchingDiscord => style(code).yellow(),
            Status::Disconnected | Status::NoClientId => style(code).red().bold(),
            Status::Disabled => style(code).dim(),
        }
    }
}

// ============================================================================
// ICONS
// ============================================================================

pub struct Icons;

impl Icons {
    pub const SUCCESS: &'static str = "✓";
    pub const ERROR: &'static str = "✗";
    pub const WARNING: &'static str = "⚠";
    pub const INFO: &'static str = "ℹ";

    pub const TELESCOPE: &'static str = "🔭";
    pub const SATELLITE: &'static str = "🛰";
    pub const ARROW_RIGHT: &'static str = "→";
}

/// Draw a section header with a line
pub fn section_header(title: &str) {
    let line_len = 50 - title.len().min(40);
    println!(
        "\n{} {}",
        Theme::header(title),
        Theme::muted("─".repeat(line_len))
    );
}

// ============================================================================
// TABLES
// ============================================================================

/// Create a styled data table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Create a minimal table (no outer borders)
pub fn create_minimal_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_NO_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text).fg(Color::Cyan).add_attribute(Attribute::Bold)
}

/// Key-value table
pub fn stats_table(items: &[(&str, String)]) -> Table {
    let mut table = create_minimal_table();

    for (key, value) in items {
        table.add_row(vec![
            Cell::new(key).fg(Color::Cyan),
            Cell::new(value)
                .fg(Color::White)
                .add_attribute(Attribute::Bold),
        ]);
    }

    table
}

/// Settings fields, with missing ones flagged
pub fn settings_table(credentials: &SessionCredentials) -> Table {
    let mut table = create_table();
    table.set_header(vec![header_cell("Setting"), header_cell("Value")]);

    let rows = [
        ("Client ID", &credentials.client_id),
        ("Steam label", &credentials.steam_label),
        ("Steam URL", &credentials.steam_url),
        ("Site label", &credentials.site_label),
        ("Site URL", &credentials.site_url),
    ];
    for (name, value) in rows {
        let value_cell = match value {
            Some(value) => Cell::new(value),
            None => Cell::new(format!("{} not set", Icons::ERROR)).fg(Color::Red),
        };
        table.add_row(vec![Cell::new(name), value_cell]);
    }

    table
}

/// Catalog listing, marking objects already shown in this rotation
pub fn catalog_table(catalog: &[AstronomicalObject], seen: impl Fn(&str) -> bool) -> Table {
    let mut table = create_table();
    table.set_header(vec![
        header_cell("Object"),
        header_cell("Type"),
        header_cell("Coordinates"),
        header_cell("Explored"),
    ]);

    for object in catalog {
        let explored = if seen(object.name) {
            Cell::new(format!("{} Yes", Icons::SUCCESS)).fg(Color::Green)
        } else {
            Cell::new("No").fg(Color::DarkGrey)
        };
        table.add_row(vec![
            Cell::new(object.name)
                .fg(Color::White)
                .add_attribute(Attribute::Bold),
            Cell::new(object.kind),
            Cell::new(format_coordinates(object.coordinates)),
            explored,
        ]);
    }

    table
}

// ============================================================================
// MESSAGES
// ============================================================================

/// One line per status change in `run`
pub fn print_status(status: Status) {
    println!("{}", status_line(status));
}

fn status_line(status: Status) -> String {
    format!(
        "{} {} {}",
        Icons::SATELLITE,
        Theme::muted("status"),
        Theme::status(status)
    )
}

/// Payload block in `run`
pub fn print_payload(payload: &PresencePayload) {
    println!(
        "{} {}\n  {}",
        Icons::TELESCOPE,
        Theme::header(&payload.details),
        payload.state
    );
    for button in &payload.buttons {
        println!(
            "  {} {} {}",
            Theme::muted(Icons::ARROW_RIGHT),
            button.label,
            Theme::muted(&button.url)
        );
    }
}

/// Print a styled error message with optional suggestion
pub fn print_error(message: &str, suggestion: Option<&str>) {
    eprintln!(
        "\n{} {}",
        Theme::error(format!("{} Error:", Icons::ERROR)),
        message
    );

    if let Some(hint) = suggestion {
        eprintln!(
            "  {} {}",
            Theme::muted(Icons::ARROW_RIGHT),
            Theme::muted(hint)
        );
    }
    eprintln!();
}

pub fn print_warning(message: &str) {
    eprintln!(
        "{} {}",
        Theme::warning(Icons::WARNING.to_string()),
        Theme::warning(message)
    );
}

pub fn print_success(message: &str) {
    println!(
        "{} {}",
        Theme::success(Icons::SUCCESS.to_string()),
        Theme::success(message)
    );
}

pub fn print_info(message: &str) {
    println!("{} {}", Theme::primary(Icons::INFO.to_string()), message);
}

/// Print the welcome banner
pub fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");

    println!();
    println!(
        "{}",
        Theme::primary("  ╭─────────────────────────────────────────────────╮")
    );
    println!(
        "{}     {}      {}",
        Theme::primary("  │"),
        Theme::header("🔭 C O S M O S   P R E S E N C E"),
        Theme::primary("│")
    );
    println!(
        "{}                  {}                   {}",
        Theme::primary("  │"),
        Theme::muted(format!("v{}", version)),
        Theme::primary("│")
    );
    println!(
        "{}",
        Theme::primary("  ╰─────────────────────────────────────────────────╯")
    );
    println!();
}
