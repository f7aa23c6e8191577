use serde::{Deserialize, Serialize};

/// Display theme. On the wire: 1 = light, 2 = dark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl From<Theme> for u8 {
    fn from(theme: Theme) -> u8 {
        match theme {
            Theme::Light => 1,
            Theme::Dark => 2,
        }
    }
}

impl TryFrom<u8> for Theme {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Theme::Light),
            2 => Ok(Theme::Dark),
            other => Err(format!("Unknown theme value: {}", other)),
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

/// Body of both GET and POST `/api/theme/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemePayload {
    pub theme: Theme,
}
