//! Types shared by the record parser, the game loader and the writer.
use crate::error::Result;
use once_cell::sync::Lazy;
use regex::Regex;

/// The only record format version accepted and written.
pub const FORMAT_VERSION: &str = "4";

// Header property tags.
pub const TAG_FORMAT: &str = "FF";
pub const TAG_SIZE: &str = "SZ";
pub const TAG_EVENT: &str = "EV";
pub const TAG_FIRST_PLAYER: &str = "PB";
pub const TAG_SECOND_PLAYER: &str = "PW";
pub const TAG_GAME_NAME: &str = "GC";
pub const TAG_SOURCE: &str = "SO";

/// Move values that are not coordinates.
pub const SWAP_TOKEN: &str = "swap";
pub const RESIGN_TOKEN: &str = "resign";

static GAME_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\s*(\d+)").unwrap());

/// Receives the semantic events of a record as the parser reads it.
///
/// Any error returned aborts the parse and is handed back to the caller
/// unchanged.
pub trait RecordHandler {
    /// A `;` opened a new node. The header node is reported too.
    fn on_node(&mut self) -> Result<()> {
        Ok(())
    }
    /// A property of the header node (the node before the first `;` that
    /// follows it).
    fn on_game_property(&mut self, name: &str, value: &str) -> Result<()>;
    /// A property of any later node: `who` is the color tag, `place` a
    /// coordinate token or a special token.
    fn on_move(&mut self, who: &str, place: &str) -> Result<()>;
    fn on_branch_start(&mut self) -> Result<()>;
    fn on_branch_stop(&mut self) -> Result<()>;
}

/// Header metadata of a game record.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    pub board_size: u8,
    pub event: String,
    /// `PB`, the player of the first color.
    pub first_player: String,
    /// `PW`, the player of the second color.
    pub second_player: String,
    /// `GC`, free-form game name.
    pub name: String,
    /// `SO`, where the record came from.
    pub source: String,
}

impl GameInfo {
    pub fn new(board_size: u8) -> Self {
        GameInfo {
            board_size,
            ..Default::default()
        }
    }

    /// Game number embedded in the name, as in LittleGolem's `" game #1301977"`.
    pub fn game_number(&self) -> Option<u64> {
        GAME_NUMBER
            .captures(&self.name)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}
