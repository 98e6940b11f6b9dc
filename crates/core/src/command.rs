//! Editor command types.
//!
//! Each command reads its own defaults and its own role slot.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    /// Append a completion after the cursor
    Complete,
    /// Replace the selection with an edited version
    Edit,
    /// Continue a chat transcript
    Chat,
    /// Generate an image
    Image,
}

impl CommandType {
    pub const ALL: [CommandType; 4] = [
        CommandType::Complete,
        CommandType::Edit,
        CommandType::Chat,
        CommandType::Image,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::Complete => "complete",
            CommandType::Edit => "edit",
            CommandType::Chat => "chat",
            CommandType::Image => "image",
        }
    }
}

impl std::fmt::Display for CommandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandType::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::Config {
                message: format!("unknown command type '{s}'"),
            })
    }
}
