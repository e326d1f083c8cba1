//! User-facing terminal output. Diagnostics go through `tracing` instead.

use crate::utils::colors::{CYAN, GREEN, GREY, RED, RESET, YELLOW};
use std::fmt;

const BOLD: &str = "\x1b[1m";

const ICON_INFO: &str = "ℹ️";
const ICON_OK: &str = "✅";
const ICON_WARN: &str = "⚠️";
const ICON_ERR: &str = "❌";
const ICON_SYNC: &str = "🔄";

pub fn info<T: fmt::Display>(msg: T) {
    println!("{CYAN}{BOLD}{ICON_INFO}{RESET} {msg}");
}

pub fn success<T: fmt::Display>(msg: T) {
    println!("{GREEN}{BOLD}{ICON_OK}{RESET} {msg}");
}

pub fn warning<T: fmt::Display>(msg: T) {
    println!("{YELLOW}{BOLD}{ICON_WARN}{RESET} {msg}");
}

pub fn error<T: fmt::Display>(msg: T) {
    eprintln!("{RED}{BOLD}{ICON_ERR}{RESET} {msg}");
}

/// Progress of a sync step.
pub fn sync<T: fmt::Display>(msg: T) {
    println!("{CYAN}{ICON_SYNC}{RESET} {msg}");
}

/// Secondary line, printed dimmed.
pub fn hint<T: fmt::Display>(msg: T) {
    println!("{GREY}   {msg}{RESET}");
}
