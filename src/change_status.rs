use std::fmt::Display;

use comfy_table::Cell;
use comfy_table::Color;

/// Where a change is in its review lifecycle.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeStatus {
    New,
    Merged,
    Abandoned,
}

impl ChangeStatus {
    pub fn cell(&self) -> Cell {
        let color = match self {
            ChangeStatus::New => Color::Green,
            ChangeStatus::Merged => Color::Magenta,
            ChangeStatus::Abandoned => Color::Red,
        };
        Cell::new(self).fg(color)
    }
}

impl Display for ChangeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeStatus::New => write!(f, "open"),
            ChangeStatus::Merged => write!(f, "merged"),
            ChangeStatus::Abandoned => write!(f, "abandoned"),
        }
    }
}
