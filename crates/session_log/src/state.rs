use std::fmt;

use crate::log::SessionLog;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one user session owns. Handlers receive it by reference; there
/// is no ambient global copy.
#[derive(Debug, Clone)]
pub struct SessionState {
    session_id: String,
    pub theme: Theme,
    pub log: SessionLog,
}

impl SessionState {
    /// Light theme, empty history, zero activity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            theme: Theme::Light,
            log: SessionLog::new(),
        }
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
