// src/theme.rs

//! Colors and status-line formatting
//!
//! Styling is a pure function of a [`Theme`] value and the text being
//! rendered. The binary builds one theme from `--no-color` / `NO_COLOR` and
//! passes it to both the console output and the interactive UI.

use crate::progress::Stage;
use crossterm::style::{Color as TermColor, Stylize, style};
use ratatui::style::{Color, Modifier, Style};

const GOLD: (u8, u8, u8) = (0xFF, 0xD7, 0x00);
const GREEN: (u8, u8, u8) = (0x00, 0xFF, 0x00);
const RED: (u8, u8, u8) = (0xFF, 0x00, 0x00);
const PURPLE: (u8, u8, u8) = (0xAF, 0x5F, 0xFF);
const BLUE: (u8, u8, u8) = (0x5F, 0x87, 0xFF);
const YELLOW: (u8, u8, u8) = (0xFF, 0xFF, 0x00);

/// Commands and their one-line descriptions, shared by `help` and the menu
pub const COMMANDS: &[(&str, &str)] = &[
    ("install <package>", "Install a package"),
    ("find <package>", "Search for a package"),
    ("remove <package>", "Remove a package"),
    ("update <package>", "Update a specific package"),
    ("update-all", "Update all installed packages (alias: upgrade)"),
    ("list", "List installed packages"),
    ("refresh", "Download the repository list"),
    ("autoremove", "Remove temporary files and logs"),
    ("ui", "Start the interactive interface"),
    ("how-to-add", "Instructions for adding new repositories"),
    ("help", "Show this help message"),
];

/// Contribution instructions printed by `how-to-add`
pub const HOW_TO_ADD: &[(&str, &str)] = &[
    ("Example repository", "https://github.com/Zenit-Linux/Sample-repo-zcr/"),
    (
        "Guide",
        "https://github.com/Zenit-Linux/zcr/wiki/Creating-your-own-repository-for-zcr",
    ),
    ("Discussions", "https://github.com/Zenit-Linux/zcr/discussions"),
    ("Issues", "https://github.com/Zenit-Linux/zcr/issues"),
    ("Documentation", "https://github.com/Zenit-Linux/zcr/blob/main/README.md"),
];

/// Role of a piece of text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Title,
    Subtitle,
    Success,
    Error,
    Warning,
    Info,
    Highlight,
    Muted,
}

impl Tone {
    fn rgb(&self) -> (u8, u8, u8) {
        match self {
            Tone::Title | Tone::Highlight => GOLD,
            Tone::Subtitle => BLUE,
            Tone::Success => GREEN,
            Tone::Error => RED,
            Tone::Warning => YELLOW,
            Tone::Info | Tone::Muted => PURPLE,
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            Tone::Success => "✔ ",
            Tone::Error => "✖ ",
            Tone::Warning => "⚠ ",
            Tone::Info => "ℹ ",
            _ => "",
        }
    }
}

/// Explicit styling configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub color: bool,
}

impl Theme {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    /// Apply a tone to text for terminal output
    pub fn paint(&self, tone: Tone, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        let (r, g, b) = tone.rgb();
        let styled = style(text).with(TermColor::Rgb { r, g, b });
        match tone {
            Tone::Info | Tone::Muted => styled.italic().to_string(),
            Tone::Title | Tone::Success | Tone::Error | Tone::Highlight => {
                styled.bold().to_string()
            }
            _ => styled.to_string(),
        }
    }

    /// Status line with the tone's marker, e.g. `✔ Package hello installed`
    pub fn line(&self, tone: Tone, message: &str) -> String {
        format!("{}{}", self.paint(tone, tone.prefix()), message)
    }

    pub fn success(&self, message: &str) -> String {
        self.line(Tone::Success, message)
    }

    pub fn error(&self, message: &str) -> String {
        self.line(Tone::Error, message)
    }

    pub fn info(&self, message: &str) -> String {
        self.line(Tone::Info, message)
    }

    pub fn package(&self, name: &str) -> String {
        self.paint(Tone::Highlight, name)
    }

    pub fn stage_line(&self, package: &str, stage: &Stage) -> String {
        let marker = self.paint(Tone::Subtitle, "➜ ");
        if package == "*" {
            format!("{}{}...", marker, stage.description())
        } else {
            format!("{}{} for {}...", marker, stage.description(), self.package(package))
        }
    }

    pub fn warning_line(&self, package: &str, message: &str) -> String {
        self.line(
            Tone::Warning,
            &format!("{}: {}", self.package(package), message),
        )
    }

    /// Equivalent ratatui style for the interactive UI
    pub fn style(&self, tone: Tone) -> Style {
        let base = match tone {
            Tone::Title | Tone::Success | Tone::Error | Tone::Highlight => {
                Style::default().add_modifier(Modifier::BOLD)
            }
            Tone::Info | Tone::Muted => Style::default().add_modifier(Modifier::ITALIC),
            _ => Style::default(),
        };
        if !self.color {
            return base;
        }
        let (r, g, b) = tone.rgb();
        base.fg(Color::Rgb(r, g, b))
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_theme_has_no_escape_codes() {
        let theme = Theme::plain();
        assert_eq!(theme.success("done"), "✔ done");
        assert_eq!(theme.error("boom"), "✖ boom");
        assert_eq!(theme.package("hello"), "hello");
        assert!(!theme.info("note").contains('\u{1b}'));
    }

    #[test]
    fn test_colored_theme_emits_escape_codes() {
        let theme = Theme::new(true);
        let line = theme.error("boom");
        assert!(line.contains('\u{1b}'));
        assert!(line.ends_with("boom"));
    }

    #[test]
    fn test_stage_line() {
        let theme = Theme::plain();
        assert_eq!(
            theme.stage_line("hello", &Stage::Cloning),
            "➜ Cloning repository for hello..."
        );
        assert_eq!(
            theme.stage_line("*", &Stage::FetchingManifest),
            "➜ Fetching repository list..."
        );
    }

    #[test]
    fn test_ui_style_respects_color_setting() {
        assert_eq!(Theme::plain().style(Tone::Subtitle), Style::default());
        assert_ne!(Theme::new(true).style(Tone::Subtitle), Style::default());
    }
}
