//! Terminal output helpers for the CLI.
//!
//! Result lines go to stdout; errors and the spinner go to stderr.

use console::{Term, style};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Display;
use std::time::Duration;

/// Print a heading with styling and clear separation
pub fn print_heading(text: &str) {
    let heading = style(format!(" {} ", text)).bold().bright().white();
    let line = style("=".repeat(50)).blue().bright();

    println!("\n{}", line);
    println!("{}", heading);
    println!("{}\n", line);
}

/// Print a section heading (smaller than main heading)
pub fn print_section(text: &str) {
    let section = style(format!(" {} ", text)).bold().white();
    let line = style("-".repeat(40)).blue();

    println!("\n{}", line);
    println!("{}", section);
    println!("{}", line);
}

/// Print an info line with label and value, with the label colored
pub fn print_info<T: Display>(label: &str, value: T) {
    println!("{}: {}", style(label).cyan().bright(), value);
}

/// Print an error message with red styling
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("Error:").bold().red().bright(), message);
}

/// Print a success message with green styling and a checkmark
pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Print a warning message with yellow styling
pub fn print_warning(message: &str) {
    println!("{} {}", style("!").yellow(), style(message).yellow());
}

/// Print a failed-item line (stdout) with a red cross
pub fn print_failure(message: &str) {
    println!("{} {}", style("✗").red().bright(), message);
}

/// Spinner shown on stderr while checks run. `None` when stderr is not a
/// terminal, so redirected output stays clean.
pub fn create_spinner(message: &str) -> Option<ProgressBar> {
    if !Term::stderr().features().is_attended() {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}
