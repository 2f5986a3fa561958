//! Configuration for loading and creating games.

use crate::coord::check_board_size;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Board size used when nothing else is configured.
pub const DEFAULT_BOARD_SIZE: u8 = 13;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Side length of the board. Records must declare the same `SZ`.
    pub board_size: u8,
    /// Follow `(`...`)` variations when loading. When false, a record with
    /// variations is rejected as unsupported.
    pub allow_variations: bool,
}

impl Config {
    /// Parse a JSON configuration, filling in defaults for missing fields.
    pub fn from_json(input: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(input).map_err(|e| Error::InvalidConfiguration {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_board_size(mut self, board_size: u8) -> Self {
        self.board_size = board_size;
        self
    }

    pub fn with_variations(mut self, allow: bool) -> Self {
        self.allow_variations = allow;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_board_size(self.board_size)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            board_size: DEFAULT_BOARD_SIZE,
            allow_variations: true,
        }
    }
}
