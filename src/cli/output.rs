//! Terminal output helpers
//!
//! Consistent, styled output for the CLI, in the spirit of modern lint
//! tooling. Styling degrades to plain text automatically when stdout is not
//! a terminal.

use console::style;

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", style("✔").green(), message);
}

/// Print an error message (always shown, goes to stderr)
pub fn error(message: &str) {
    eprintln!("{} {}", style("✖").red(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    println!("{} {}", style("⚠").yellow(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", style("ℹ").blue(), message);
}

/// Print a step in a process
pub fn step(message: &str) {
    println!("{} {}", style("❯").cyan(), message);
}

/// Print a header/title
pub fn header(title: &str) {
    println!("\n{}", style(title).bold().underlined());
}

/// Print a key-value pair with consistent styling
pub fn key_value(key: &str, value: &str) {
    println!("  {} {}", style(key).dim(), value);
}

/// Print summary statistics with consistent styling
pub fn summary_stats(label: &str, value: &str) {
    println!("  {} {}", style(label).dim(), style(value).bold());
}

/// Print a list item
pub fn list_item(item: &str) {
    println!("  • {}", item);
}

/// Print blank line
pub fn blank_line() {
    println!();
}
