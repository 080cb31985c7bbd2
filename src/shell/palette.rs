use colored::{ColoredString, Colorize};
use session_log::Theme;

/// Terminal colors for the current theme. A disabled palette returns text unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    theme: Theme,
    enabled: bool,
}

impl Palette {
    #[must_use]
    pub fn new(theme: Theme, enabled: bool) -> Self {
        Self { theme, enabled }
    }

    #[must_use]
    pub fn with_theme(self, theme: Theme) -> Self {
        Self { theme, ..self }
    }

    pub fn heading(&self, text: &str) -> String {
        self.paint(text, |text| match self.theme {
            Theme::Light => text.blue().bold(),
            Theme::Dark => text.bright_cyan().bold(),
        })
    }

    pub fn accent(&self, text: &str) -> String {
        self.paint(text, |text| match self.theme {
            Theme::Light => text.magenta(),
            Theme::Dark => text.bright_magenta(),
        })
    }

    pub fn muted(&self, text: &str) -> String {
        self.paint(text, |text| match self.theme {
            Theme::Light => text.dimmed(),
            Theme::Dark => text.bright_black(),
        })
    }

    pub fn warning(&self, text: &str) -> String {
        self.paint(text, |text| text.yellow())
    }

    pub fn error(&self, text: &str) -> String {
        self.paint(text, |text| text.red())
    }

    fn paint(&self, text: &str, style: impl FnOnce(&str) -> ColoredString) -> String {
        if self.enabled {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }
}
