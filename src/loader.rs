use crate::config::Config;
use crate::coord;
use crate::error::{Error, Result};
use crate::events::Presenter;
use crate::record::*;
use crate::tree::{Color, Game, Move, NodeId};
use tracing::debug;

/// Applies parsed record events to a game.
///
/// Header values are checked as they arrive; moves are played from the
/// cursor through [`Game::play_move`], so replaying a line that already
/// exists follows it instead of duplicating it. Variations are followed by
/// remembering the node each one starts from. A node holds at most one move
/// and a variation at least one.
pub struct GameLoader<'a> {
    game: &'a mut Game,
    presenter: &'a mut dyn Presenter,
    allow_variations: bool,
    info: GameInfo,
    saw_format: bool,
    saw_size: bool,
    /// The node being read already played its move.
    node_has_move: bool,
    /// Cursor and move count at each open variation.
    branch_points: Vec<(NodeId, usize)>,
    moves: usize,
}

impl<'a> GameLoader<'a> {
    pub fn new(game: &'a mut Game, config: &Config, presenter: &'a mut dyn Presenter) -> Self {
        let info = GameInfo::new(game.board_size());
        GameLoader {
            game,
            presenter,
            allow_variations: config.allow_variations,
            info,
            saw_format: false,
            saw_size: false,
            node_has_move: false,
            branch_points: Vec::new(),
            moves: 0,
        }
    }

    /// Number of move properties applied so far.
    pub fn moves(&self) -> usize {
        self.moves
    }

    /// Check the header was complete and store it on the game.
    pub fn finish(self) -> Result<GameInfo> {
        self.require_header()?;
        self.game.info = self.info.clone();
        Ok(self.info)
    }

    fn require_header(&self) -> Result<()> {
        if !self.saw_format {
            return Err(Error::invalid_format("missing FF header property"));
        }
        if !self.saw_size {
            return Err(Error::invalid_format("missing SZ header property"));
        }
        Ok(())
    }

    fn move_from_token(&self, token: &str) -> Result<Move> {
        match token {
            SWAP_TOKEN => Ok(Move::Swap),
            RESIGN_TOKEN => Ok(Move::Resign),
            _ => {
                let invalid = || Error::InvalidMoveToken {
                    token: token.to_string(),
                };
                let point = coord::decode(token).map_err(|_| invalid())?;
                if !point.on_board(self.game.board_size()) {
                    return Err(invalid());
                }
                Ok(Move::Place(point))
            }
        }
    }
}

impl RecordHandler for GameLoader<'_> {
    fn on_node(&mut self) -> Result<()> {
        self.node_has_move = false;
        Ok(())
    }

    fn on_game_property(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            TAG_FORMAT => {
                if value != FORMAT_VERSION {
                    return Err(Error::invalid_format(format!(
                        "unsupported format version '{}' (expected {})",
                        value, FORMAT_VERSION
                    )));
                }
                self.saw_format = true;
            }
            TAG_SIZE => {
                let expected = self.game.board_size().to_string();
                if value != expected {
                    return Err(Error::invalid_format(format!(
                        "board size '{}' does not match {}",
                        value, expected
                    )));
                }
                self.saw_size = true;
            }
            TAG_EVENT => self.info.event = value.to_string(),
            TAG_FIRST_PLAYER => self.info.first_player = value.to_string(),
            TAG_SECOND_PLAYER => self.info.second_player = value.to_string(),
            TAG_GAME_NAME => self.info.name = value.to_string(),
            TAG_SOURCE => self.info.source = value.to_string(),
            "W" | "B" => {
                return Err(Error::invalid_format(format!(
                    "move {}[{}] inside the header node",
                    name, value
                )))
            }
            _ => debug!(property = name, "ignoring header property"),
        }
        Ok(())
    }

    fn on_move(&mut self, who: &str, place: &str) -> Result<()> {
        self.require_header()?;
        let color = Color::from_tag(who)?;
        let mv = self.move_from_token(place)?;
        if self.node_has_move {
            return Err(Error::invalid_format(format!(
                "second move {}[{}] in one node",
                who, place
            )));
        }
        self.game.play_move(mv, color, &mut *self.presenter)?;
        self.node_has_move = true;
        self.moves += 1;
        Ok(())
    }

    fn on_branch_start(&mut self) -> Result<()> {
        if !self.allow_variations {
            return Err(Error::UnsupportedFeature {
                feature: "variations",
            });
        }
        self.require_header()?;
        let from = self.game.cursor();
        debug!(node = from, depth = self.branch_points.len(), "variation start");
        self.branch_points.push((from, self.moves));
        Ok(())
    }

    fn on_branch_stop(&mut self) -> Result<()> {
        if !self.allow_variations {
            return Err(Error::UnsupportedFeature {
                feature: "variations",
            });
        }
        let (back, moves_before) = self
            .branch_points
            .pop()
            .ok_or_else(|| Error::invalid_format("variation closed without being opened"))?;
        if self.moves == moves_before {
            return Err(Error::invalid_format("empty variation"));
        }
        debug!(node = back, "variation stop");
        self.game.jump_to(back, &mut *self.presenter)
    }
}
