//! Terminal formatting shared by the subcommands

use colored::*;

/// Display a section header with an underline
pub fn section_header(title: &str) {
    println!("\n{}", title.bold().cyan());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Display a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Display an info message
pub fn info(message: &str) {
    println!("{} {}", "●".blue(), message);
}

/// Warnings go to stderr so piped JSON or Newick output stays clean
pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message);
}

/// Tree structure item
pub fn tree_item(is_last: bool, label: &str, value: Option<&str>) {
    let prefix = if is_last { "└─" } else { "├─" };
    if let Some(val) = value {
        println!("{} {}: {}", prefix.dimmed(), label, val);
    } else {
        println!("{} {}", prefix.dimmed(), label);
    }
}

/// Format a count with thousands separators
pub fn format_number(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
