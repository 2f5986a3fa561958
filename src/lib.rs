pub mod config;
pub mod coord;
pub mod error;
pub mod events;
pub mod loader;
pub mod parser;
pub mod record;
pub mod snapshot;
pub mod tree;
pub mod validate;
pub mod writer;

use config::Config;
use error::{Error, Result};
use events::{EventLog, Presenter, TreeEvent};
use loader::GameLoader;
use record::GameInfo;
use tree::{Game, ROOT};

pub use snapshot::Snapshot;
pub use validate::{validate_tree, InvariantError};
pub use writer::write_game;

// ── Core API ───────────────────────────────────────────────────────

/// Load a game record into `game`, replaying its moves from the root.
///
/// The record is applied to a copy of the game first. Only when the whole
/// record is accepted does the copy replace `game` and do the buffered
/// notifications reach `presenter`; a rejected record leaves both untouched.
pub fn load_record(
    game: &mut Game,
    input: &str,
    config: &Config,
    presenter: &mut dyn Presenter,
) -> Result<GameInfo> {
    let mut staged = game.clone();
    let mut log = EventLog::new();
    staged.jump_to(ROOT, &mut log)?;

    let loaded = {
        let mut loader = GameLoader::new(&mut staged, config, &mut log);
        parser::parse(input, &mut loader).and_then(|()| {
            let moves = loader.moves();
            loader.finish().map(|info| (info, moves))
        })
    };
    let (info, moves) = loaded.map_err(|err| {
        tracing::warn!(code = err.code(), "record rejected: {}", err);
        err
    })?;

    *game = staged;
    log.replay(presenter);
    tracing::info!(moves, board_size = info.board_size, "record loaded");
    Ok(info)
}

/// Holds the one game a process works on.
///
/// `create` refuses to build a second game, so every caller that reaches the
/// game through the slot shares the same tree.
#[derive(Debug, Default)]
pub struct GameSlot {
    game: Option<Game>,
    config: Config,
}

impl GameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the game. Returns `None` and changes nothing when a game
    /// already exists; fails when `config` does not validate.
    pub fn create(&mut self, config: Config) -> Result<Option<&mut Game>> {
        if self.game.is_some() {
            tracing::debug!("game already created");
            return Ok(None);
        }
        config.validate()?;
        self.game = Some(Game::new(config.board_size)?);
        self.config = config;
        Ok(self.game.as_mut())
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    pub fn game_mut(&mut self) -> Option<&mut Game> {
        self.game.as_mut()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

// ── WASM FFI ────────────────────────────────────────────────────────

/// Allocate `len` bytes in WASM memory, returning a pointer.
/// The caller must free the returned pointer with `dealloc(ptr, len)`.
#[no_mangle]
pub extern "C" fn alloc(len: usize) -> *mut u8 {
    let layout = std::alloc::Layout::from_size_align(len, 1).unwrap();
    unsafe { std::alloc::alloc(layout) }
}

/// Free a buffer previously returned by `alloc` or by any of the
/// `wasm_*` functions. For null-terminated strings returned by those
/// functions, pass `strlen(ptr) + 1` as `len`.
#[no_mangle]
pub unsafe extern "C" fn dealloc(ptr: *mut u8, len: usize) {
    let layout = std::alloc::Layout::from_size_align(len, 1).unwrap();
    unsafe { std::alloc::dealloc(ptr, layout) };
}

// ── Game FFI ────────────────────────────────────────────────────────

use serde::Serialize;
use std::cell::RefCell;
use tree::{Direction, Move};

// WASM is single-threaded, so thread_local is just a convenient safe wrapper.
thread_local! {
    static SLOT: RefCell<GameSlot> = RefCell::new(GameSlot::new());
}

#[derive(Serialize)]
struct ErrorView {
    code: &'static str,
    message: String,
}

impl From<&Error> for ErrorView {
    fn from(err: &Error) -> Self {
        ErrorView {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// What every mutating call hands back to the page.
#[derive(Serialize)]
struct Response<'a> {
    errors: Vec<ErrorView>,
    events: &'a [TreeEvent],
}

/// What `wasm_game_write` hands back: the record, or why there is none.
#[derive(Serialize)]
struct WriteResponse {
    errors: Vec<ErrorView>,
    record: Option<String>,
}

fn respond(result: Result<()>, log: &EventLog) -> *const u8 {
    let errors = match &result {
        Ok(()) => Vec::new(),
        Err(err) => vec![err.into()],
    };
    let response = Response {
        errors,
        events: &log.events,
    };
    string_to_c_ptr(serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string()))
}

/// Run `f` against the game and return the resulting notifications as JSON.
fn with_game(f: impl FnOnce(&mut Game, &Config, &mut EventLog) -> Result<()>) -> *const u8 {
    let mut log = EventLog::new();
    let result = SLOT.with(|slot| {
        let mut slot = slot.borrow_mut();
        let config = slot.config().clone();
        match slot.game_mut() {
            Some(game) => f(game, &config, &mut log),
            None => Err(Error::precondition("no game has been created")),
        }
    });
    respond(result, &log)
}

/// Create the process's game with the given board size (0 for the default).
/// Returns 1 when created, 0 when a game already exists or the size is invalid.
#[no_mangle]
pub extern "C" fn wasm_game_create(board_size: u32) -> u32 {
    let mut config = Config::default();
    if board_size != 0 {
        match u8::try_from(board_size) {
            Ok(size) => config = config.with_board_size(size),
            Err(_) => return 0,
        }
    }
    SLOT.with(|slot| matches!(slot.borrow_mut().create(config), Ok(Some(_))) as u32)
}

/// Load a record into the game.
/// Returns a pointer to a null-terminated JSON response.
#[no_mangle]
pub unsafe extern "C" fn wasm_game_load(src_ptr: *const u8, src_len: usize) -> *const u8 {
    let bytes = unsafe { std::slice::from_raw_parts(src_ptr, src_len) };
    let input = match std::str::from_utf8(bytes) {
        Ok(input) => input,
        Err(e) => {
            let err = Error::precondition(format!("record is not valid UTF-8: {}", e));
            return respond(Err(err), &EventLog::new());
        }
    };
    with_game(|game, config, log| load_record(game, input, config, log).map(|_| ()))
}

/// Place a stone for the side to move, as a click on the board does.
#[no_mangle]
pub extern "C" fn wasm_game_play(x: u32, y: u32) -> *const u8 {
    with_game(|game, _, log| {
        let axis = |v: u32| {
            u8::try_from(v)
                .map_err(|_| Error::precondition(format!("coordinate {} is off the board", v)))
        };
        let point = coord::Point::new(axis(x)?, axis(y)?);
        let color = game.color_to_move();
        game.play_move(Move::Place(point), color, log).map(|_| ())
    })
}

/// Swap sides instead of placing a stone.
#[no_mangle]
pub extern "C" fn wasm_game_swap() -> *const u8 {
    with_game(|game, _, log| {
        let color = game.color_to_move();
        game.play_move(Move::Swap, color, log).map(|_| ())
    })
}

/// Move the cursor to node `id`.
#[no_mangle]
pub extern "C" fn wasm_game_jump(id: u32) -> *const u8 {
    with_game(|game, _, log| game.jump_to(id as usize, log))
}

/// Keyboard navigation: 0 back, 1 forward, 2 previous variation,
/// 3 next variation. Unknown steps do nothing.
#[no_mangle]
pub extern "C" fn wasm_game_navigate(step: u32) -> *const u8 {
    with_game(|game, _, log| {
        match step {
            0 => game.step_back(log),
            1 => game.step_forward(log),
            2 => game.cycle_branches(Direction::Previous, log),
            3 => game.cycle_branches(Direction::Next, log),
            _ => false,
        };
        Ok(())
    })
}

/// Delete the cursor's subtree.
#[no_mangle]
pub extern "C" fn wasm_game_remove_current() -> *const u8 {
    with_game(|game, _, log| {
        let current = game.cursor();
        game.remove_subtree(current, log);
        Ok(())
    })
}

/// Serialize the move list view of the game.
/// Returns a pointer to a null-terminated JSON string.
#[no_mangle]
pub extern "C" fn wasm_game_snapshot() -> *const u8 {
    SLOT.with(|slot| match slot.borrow().game() {
        Some(game) => string_to_c_ptr(Snapshot::of(game).to_json()),
        None => string_to_c_ptr("{}".to_string()),
    })
}

/// Write the game as a record.
/// Returns a pointer to a null-terminated JSON object holding either the
/// record or the errors that prevented writing it.
#[no_mangle]
pub extern "C" fn wasm_game_write() -> *const u8 {
    let result = SLOT.with(|slot| match slot.borrow().game() {
        Some(game) => write_game(game),
        None => Err(Error::precondition("no game has been created")),
    });
    let response = match result {
        Ok(record) => WriteResponse {
            errors: Vec::new(),
            record: Some(record),
        },
        Err(err) => WriteResponse {
            errors: vec![(&err).into()],
            record: None,
        },
    };
    string_to_c_ptr(serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string()))
}

/// Convert a String to a null-terminated C pointer with exact allocation size.
/// The allocation size is exactly `s.len() + 1` bytes, so the caller can
/// free with `dealloc(ptr, strlen(ptr) + 1)`.
fn string_to_c_ptr(s: String) -> *const u8 {
    let mut bytes = s.into_bytes();
    bytes.push(0);
    // into_boxed_slice guarantees allocation size == bytes.len()
    let boxed = bytes.into_boxed_slice();
    Box::into_raw(boxed) as *mut u8
}


#[cfg(test)]
mod property_tests;
