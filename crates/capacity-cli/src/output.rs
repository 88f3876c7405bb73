//! Output formatting utilities

use capacity_core::{EvalStatus, LoadLevel, Trend};
use clap::ValueEnum;
use colored::Colorize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", title.bold());
    println!("{}", "-".repeat(title.len()));
}

/// Format millicores as human-readable string
pub fn format_millicores(millicores: u64) -> String {
    if millicores >= 1000 && millicores % 1000 == 0 {
        format!("{}", millicores / 1000)
    } else if millicores >= 1000 {
        format!("{:.1}", millicores as f64 / 1000.0)
    } else {
        format!("{}m", millicores)
    }
}

/// Format MiB as human-readable string
pub fn format_mib(mib: u64) -> String {
    if mib >= 1024 && mib % 1024 == 0 {
        format!("{}Gi", mib / 1024)
    } else if mib >= 1024 {
        format!("{:.2}Gi", mib as f64 / 1024.0)
    } else {
        format!("{}Mi", mib)
    }
}

/// Color an evaluation status
pub fn color_eval_status(status: EvalStatus) -> String {
    match status {
        EvalStatus::Ok => "ok".green().to_string(),
        EvalStatus::Warning => "warning".yellow().to_string(),
    }
}

/// Color a load level
pub fn color_load_level(level: LoadLevel) -> String {
    let label = level.to_string();
    match level {
        LoadLevel::Healthy => label.green().to_string(),
        LoadLevel::Medium => label.yellow().to_string(),
        LoadLevel::High => label.red().to_string(),
        LoadLevel::Overload | LoadLevel::Critical => label.red().bold().to_string(),
    }
}

/// Trend arrow for a per-pod rate; rising load is the alarming direction
pub fn trend_arrow(trend: Trend) -> String {
    match trend {
        Trend::Steady => "→".to_string(),
        Trend::Rising => "↑".red().to_string(),
        Trend::Falling => "↓".green().to_string(),
    }
}

/// Color a latency value against green/yellow/red thresholds in ms
pub fn color_latency(value_ms: f64, warn_ms: f64, crit_ms: f64) -> String {
    let formatted = format!("{value_ms:.1}ms");
    if value_ms < warn_ms {
        formatted.green().to_string()
    } else if value_ms < crit_ms {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}
