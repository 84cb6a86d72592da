// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::IsTerminal;

use clap::builder::styling::{Ansi256Color, Color, Style, Styles};

pub mod codes {
    /// Section headers: steel blue
    pub const HEADER: u8 = 74;
    /// Commands and literals: light grey
    pub const LITERAL: u8 = 250;
    /// Descriptions and context: medium grey
    pub const CONTEXT: u8 = 245;
    /// Muted / secondary text: darker grey
    pub const MUTED: u8 = 240;

    #[cfg(test)]
    pub const HEADER_START: &str = "\x1b[38;5;74m";
    #[cfg(test)]
    pub const MUTED_START: &str = "\x1b[38;5;240m";
    #[cfg(test)]
    pub const RESET: &str = "\x1b[0m";
}

/// Clap help palette, built from the same codes as table output.
pub fn styles() -> Styles {
    if !should_colorize() {
        return Styles::plain();
    }
    let fixed = |code: u8| Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(code))));
    Styles::styled()
        .header(fixed(codes::HEADER))
        .usage(fixed(codes::HEADER))
        .literal(fixed(codes::LITERAL))
        .placeholder(fixed(codes::CONTEXT))
}

/// Determine if color output should be enabled.
///
/// Priority: `NO_COLOR=1` disables, then `COLOR=1` forces, then TTY check.
pub fn should_colorize() -> bool {
    if crate::env::no_color() {
        return false;
    }
    if crate::env::force_color() {
        return true;
    }
    std::io::stdout().is_terminal()
}

fn fg256(code: u8) -> String {
    format!("\x1b[38;5;{code}m")
}

const RESET: &str = "\x1b[0m";

/// Format text with the header color.
pub fn header(text: &str) -> String {
    if should_colorize() {
        apply_header(text)
    } else {
        text.to_string()
    }
}

pub(crate) fn apply_header(text: &str) -> String {
    format!("{}{}{}", fg256(codes::HEADER), text, RESET)
}

/// Format text with the muted color.
pub fn muted(text: &str) -> String {
    if should_colorize() {
        apply_muted(text)
    } else {
        text.to_string()
    }
}

pub(crate) fn apply_muted(text: &str) -> String {
    format!("{}{}{}", fg256(codes::MUTED), text, RESET)
}

pub fn green(text: &str) -> String {
    if !should_colorize() {
        return text.to_string();
    }
    format!("\x1b[32m{text}{RESET}")
}

pub fn yellow(text: &str) -> String {
    if !should_colorize() {
        return text.to_string();
    }
    format!("\x1b[33m{text}{RESET}")
}

/// Colorize a target state by its first word.
///
/// Green for live targets, yellow for targets that should be running but
/// are not, red for failures. Anything else is left alone.
pub fn status(text: &str) -> String {
    if !should_colorize() {
        return text.to_string();
    }
    apply_status(text)
}

pub(crate) fn apply_status(text: &str) -> String {
    let lower = text.trim_start().to_lowercase();
    let first_word = lower
        .split(|c: char| !c.is_alphabetic())
        .next()
        .unwrap_or("");
    let code = match first_word {
        "running" | "started" | "yes" => "\x1b[32m",
        "down" | "stopped" | "waiting" => "\x1b[33m",
        "failed" | "error" => "\x1b[31m",
        _ => return text.to_string(),
    };
    format!("{code}{text}{RESET}")
}

#[cfg(test)]
#[path = "color_tests.rs"]
mod tests;
