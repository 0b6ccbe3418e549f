use crate::core::filter::FilterState;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Label,
    Value,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Label => style(text).bold(),
        StyleType::Value => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Right-aligned amount; `N/A` is greyed out.
pub fn amount_cell(text: &str) -> Cell {
    let cell = Cell::new(text).set_alignment(CellAlignment::Right);
    if text == "N/A" {
        cell.fg(Color::DarkGrey)
    } else {
        cell
    }
}

pub fn count_cell(count: u64) -> Cell {
    Cell::new(count).set_alignment(CellAlignment::Right)
}

/// Creates a cell for a price movement, green when up and red otherwise.
pub fn direction_cell(text: &str, up: bool) -> Cell {
    let color = if up { Color::Green } else { Color::Red };
    Cell::new(text).fg(color).set_alignment(CellAlignment::Right)
}

/// Horizontal bar scaled against `max`, for chart-like tables.
pub fn bar(value: f64, max: f64, width: usize) -> String {
    if !(value.is_finite() && max.is_finite()) || max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let filled = ((value / max) * width as f64).round() as usize;
    "█".repeat(filled.clamp(1, width))
}

/// One-line summary of the active filters.
pub fn filter_banner(filter: &FilterState) -> String {
    let location = filter.location_param().unwrap_or("any location");
    format!(
        "{} {} · {} · {} · {}",
        style_text("Filters:", StyleType::Label),
        filter.property_type,
        filter.region,
        location,
        filter.currency.code()
    )
}

/// Message shown in place of a view that has nothing to display.
pub fn empty_notice(what: &str) -> String {
    style_text(
        &format!("No {what} available for the selected filters."),
        StyleType::Subtle,
    )
}

/// Creates a new `indicatif::ProgressBar` with standard styling.
pub fn new_progress_bar(len: u64, with_message: bool) -> ProgressBar {
    let template = if with_message {
        "{spinner:.green} {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}"
    } else {
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}"
    };

    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Prints a separator line matching the terminal width.
pub fn print_separator() {
    let term_width = console::Term::stdout()
        .size_checked()
        .map(|(_, w)| w as usize)
        .unwrap_or(80);
    println!("\n{}", "─".repeat(term_width));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter::Region;

    #[test]
    fn test_bar_scaling() {
        assert_eq!(bar(5.0, 10.0, 10), "█████");
        assert_eq!(bar(0.1, 10.0, 10), "█");
        assert_eq!(bar(20.0, 10.0, 10), "██████████");
        assert_eq!(bar(0.0, 10.0, 10), "");
        assert_eq!(bar(f64::NAN, 10.0, 10), "");
    }

    #[test]
    fn test_filter_banner() {
        console::set_colors_enabled(false);
        let filter = FilterState::default()
            .with_region(Region::West)
            .with_location("Tamarin");
        let banner = filter_banner(&filter);
        assert!(banner.contains("West"));
        assert!(banner.contains("Tamarin"));
        assert!(banner.contains("MUR"));
        assert!(filter_banner(&FilterState::default()).contains("any location"));
    }
}
