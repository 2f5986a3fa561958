use crate::error::Result;
use crate::record::RecordHandler;
use tracing::trace;

/// Where the lexer is in the record grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexState {
    /// Before the opening `(` of the first game.
    Collection,
    /// Inside a sequence, between nodes.
    Seq,
    /// Reading property names of a node.
    Node,
    /// Inside a bracketed property value.
    Prop,
}

/// Whether the lexer wants more input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The first game closed; anything after it is ignored.
    Stop,
}

/// Character-at-a-time lexer for the record grammar.
///
/// Nesting is tracked with a single counter, so memory stays constant however
/// deep the variations go. Which variation is closing is left to the handler.
#[derive(Debug, Clone)]
pub struct Lexer {
    state: LexState,
    depth: usize,
    /// True until the header node ends.
    header: bool,
    escaped: bool,
    prop_name: String,
    accum: String,
}

/// Parse the first game of `input`, reporting it to `handler`.
pub fn parse<H: RecordHandler + ?Sized>(input: &str, handler: &mut H) -> Result<()> {
    let mut lexer = Lexer::new();
    for c in input.chars() {
        if lexer.push(c, handler)? == Flow::Stop {
            break;
        }
    }
    Ok(())
}

impl Lexer {
    pub fn new() -> Self {
        Lexer {
            state: LexState::Collection,
            depth: 0,
            header: true,
            escaped: false,
            prop_name: String::new(),
            accum: String::new(),
        }
    }

    pub fn state(&self) -> LexState {
        self.state
    }

    /// Number of variations currently open.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Feed one character.
    pub fn push<H: RecordHandler + ?Sized>(&mut self, c: char, handler: &mut H) -> Result<Flow> {
        use LexState::*;

        if self.escaped {
            self.escaped = false;
            self.accum.push(c);
            return Ok(Flow::Continue);
        }

        match (self.state, c) {
            (Collection, '(') => self.enter(Seq),
            (Seq, ';') => {
                self.accum.clear();
                self.enter(Node);
                handler.on_node()?;
            }
            (Node, ';') => {
                self.accum.clear();
                self.header = false;
                self.enter(Node);
                handler.on_node()?;
            }
            (Node, '[') => {
                self.prop_name = self.accum.trim().to_string();
                self.accum.clear();
                self.enter(Prop);
            }
            (Seq | Node, '(') => {
                self.accum.clear();
                self.depth += 1;
                self.header = false;
                self.enter(Seq);
                handler.on_branch_start()?;
            }
            (Seq | Node, ')') => {
                self.accum.clear();
                if self.depth == 0 {
                    trace!("first game closed");
                    return Ok(Flow::Stop);
                }
                handler.on_branch_stop()?;
                self.depth -= 1;
                self.enter(Seq);
            }
            (Prop, '\\') => self.escaped = true,
            (Prop, ']') => {
                let value = std::mem::take(&mut self.accum);
                self.enter(Node);
                if self.prop_name.is_empty() {
                    trace!(value = %value, "skipping value without a property name");
                } else if self.header {
                    handler.on_game_property(&self.prop_name, &value)?;
                } else {
                    handler.on_move(&self.prop_name, &value)?;
                }
                self.prop_name.clear();
            }
            (Node | Prop, _) => self.accum.push(c),
            (Collection | Seq, _) => {}
        }
        Ok(Flow::Continue)
    }

    fn enter(&mut self, next: LexState) {
        trace!(from = ?self.state, to = ?next, depth = self.depth, "lexer transition");
        self.state = next;
    }
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}
