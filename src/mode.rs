use serde::{Deserialize, Serialize};

/// How query results are presented: raw snippets or a synthesized answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Search,
    #[default]
    Chat,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Search => "search",
            Mode::Chat => "chat",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "search" => Some(Mode::Search),
            "chat" => Some(Mode::Chat),
            _ => None,
        }
    }

    pub fn all() -> Vec<Mode> {
        vec![Mode::Search, Mode::Chat]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Search => "Search",
            Mode::Chat => "AI Chat",
        }
    }

    pub fn toggled(&self) -> Mode {
        match self {
            Mode::Search => Mode::Chat,
            Mode::Chat => Mode::Search,
        }
    }
}
