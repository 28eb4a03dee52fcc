//! # Output Configuration
//!
//! This module controls how user-facing messages look: colour support based
//! on terminal capabilities and user preferences, and the leveled `>>> text`
//! lines every command prints.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use polyrepo::output::{Console, OutputConfig};
//!
//! let console = Console::new(OutputConfig::from_env_and_flag("auto"));
//! console.info_title("Linking shared modules");
//! console.success("Linked in front/modules/ui-admin module @shared");
//! ```

use std::env;

use console::{style, StyledObject};

/// Output configuration for controlling colors.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// - `always`: force colors on (overrides NO_COLOR)
    /// - `never`: force colors off
    /// - anything else: detect based on environment
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    /// Detect whether color output is supported based on environment.
    fn detect_color_support() -> bool {
        // The presence of NO_COLOR (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    /// Create a configuration with colors always enabled.
    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Message levels, each with its own style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    InfoTitle,
    Info,
    SuccessTitle,
    Success,
    ErrorTitle,
    Error,
}

/// Prints leveled `>>> text` lines to stdout.
#[derive(Debug, Clone, Default)]
pub struct Console {
    config: OutputConfig,
}

impl Console {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Renders a message without printing it.
    pub fn render(&self, level: Level, text: &str) -> String {
        let line = format!(">>> {} ", text);
        let styled: StyledObject<String> = match level {
            Level::InfoTitle => style(line).on_blue().white().bright(),
            Level::Info => style(line).blue(),
            Level::SuccessTitle => style(line).on_green().black(),
            Level::Success => style(line).green(),
            Level::ErrorTitle => style(line).on_red().white().bright(),
            Level::Error => style(line).red(),
        };
        styled.force_styling(self.config.use_color).to_string()
    }

    pub fn print(&self, level: Level, text: &str) {
        println!("{}", self.render(level, text));
    }

    pub fn info_title(&self, text: &str) {
        self.print(Level::InfoTitle, text);
    }

    pub fn info(&self, text: &str) {
        self.print(Level::Info, text);
    }

    pub fn success_title(&self, text: &str) {
        self.print(Level::SuccessTitle, text);
    }

    pub fn success(&self, text: &str) {
        self.print(Level::Success, text);
    }

    pub fn error_title(&self, text: &str) {
        self.print(Level::ErrorTitle, text);
    }

    pub fn error(&self, text: &str) {
        self.print(Level::Error, text);
    }
}
