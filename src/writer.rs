use crate::coord;
use crate::error::Result;
use crate::record::*;
use crate::tree::{Color, Game, Move, NodeId, ROOT};

/// One move handed to the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    pub color: Color,
    pub mv: Move,
}

/// Yields the moves of a game in record order.
///
/// `is_new_variant` and `is_end_of_variant` describe the record that the next
/// call to `next` returns.
pub trait RecordProducer {
    fn has_more(&self) -> bool;
    fn is_new_variant(&self) -> bool;
    fn is_end_of_variant(&self) -> bool;
    /// How many variations close after the next record. Producers with
    /// nested variations override this; one closing is assumed otherwise.
    fn closing_variants(&self) -> usize {
        usize::from(self.is_end_of_variant())
    }
    fn next(&mut self) -> Option<Record>;
}

/// Serialize a header and the producer's moves as a record.
pub fn write_record<P: RecordProducer + ?Sized>(info: &GameInfo, producer: &mut P) -> Result<String> {
    let mut out = String::from("(");
    out.push(';');
    write_property(&mut out, TAG_FORMAT, FORMAT_VERSION);
    write_property(&mut out, TAG_EVENT, &info.event);
    write_property(&mut out, TAG_FIRST_PLAYER, &info.first_player);
    write_property(&mut out, TAG_SECOND_PLAYER, &info.second_player);
    write_property(&mut out, TAG_SIZE, &info.board_size.to_string());
    write_property(&mut out, TAG_GAME_NAME, &info.name);
    write_property(&mut out, TAG_SOURCE, &info.source);

    while producer.has_more() {
        let opens = producer.is_new_variant();
        let closes = producer.closing_variants();
        let Some(record) = producer.next() else {
            break;
        };
        if opens {
            out.push('(');
        }
        out.push(';');
        let token = match record.mv {
            Move::Place(point) => coord::encode(point)?,
            Move::Swap => SWAP_TOKEN.to_string(),
            Move::Resign => RESIGN_TOKEN.to_string(),
        };
        write_property(&mut out, record.color.tag(), &token);
        for _ in 0..closes {
            out.push(')');
        }
    }

    out.push(')');
    Ok(out)
}

/// Write a whole game, variations included, with its own header.
pub fn write_game(game: &Game) -> Result<String> {
    write_record(&game.info, &mut TreeProducer::new(game))
}

fn write_property(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push('[');
    for c in value.chars() {
        if c == ']' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push(']');
}

struct Entry {
    node: NodeId,
    opens: bool,
    closes: usize,
}

/// Walks a game tree in preorder. Every child of a node with several
/// children becomes its own parenthesized variation, in child order.
pub struct TreeProducer<'a> {
    game: &'a Game,
    entries: Vec<Entry>,
    pos: usize,
}

impl<'a> TreeProducer<'a> {
    pub fn new(game: &'a Game) -> Self {
        let mut entries = Vec::new();
        collect_line(game, ROOT, &mut entries);
        TreeProducer {
            game,
            entries,
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&Entry> {
        self.entries.get(self.pos)
    }
}

/// Append the continuation below `id` (not `id` itself).
fn collect_line(game: &Game, id: NodeId, entries: &mut Vec<Entry>) {
    let mut id = id;
    loop {
        let Some(node) = game.node(id) else {
            return;
        };
        match node.children.as_slice() {
            [] => return,
            [only] => {
                entries.push(Entry {
                    node: *only,
                    opens: false,
                    closes: 0,
                });
                id = *only;
            }
            children => {
                for &child in children {
                    entries.push(Entry {
                        node: child,
                        opens: true,
                        closes: 0,
                    });
                    collect_line(game, child, entries);
                    if let Some(last) = entries.last_mut() {
                        last.closes += 1;
                    }
                }
                return;
            }
        }
    }
}

impl RecordProducer for TreeProducer<'_> {
    fn has_more(&self) -> bool {
        self.pos < self.entries.len()
    }

    fn is_new_variant(&self) -> bool {
        self.peek().is_some_and(|e| e.opens)
    }

    fn is_end_of_variant(&self) -> bool {
        self.closing_variants() > 0
    }

    fn closing_variants(&self) -> usize {
        self.peek().map_or(0, |e| e.closes)
    }

    fn next(&mut self) -> Option<Record> {
        let entry = self.entries.get(self.pos)?;
        self.pos += 1;
        let node = self.game.node(entry.node)?;
        Some(Record {
            color: node.color?,
            mv: node.as_move()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Point;
    use crate::events::NullPresenter;

    /// Producer over a flat list, the shape a linear game has.
    struct Linear {
        records: Vec<Record>,
        pos: usize,
    }

    impl RecordProducer for Linear {
        fn has_more(&self) -> bool {
            self.pos < self.records.len()
        }
        fn is_new_variant(&self) -> bool {
            false
        }
        fn is_end_of_variant(&self) -> bool {
            false
        }
        fn next(&mut self) -> Option<Record> {
            let record = self.records.get(self.pos).copied();
            self.pos += 1;
            record
        }
    }

    fn header() -> GameInfo {
        GameInfo {
            board_size: 13,
            event: "hex.mc.2011.feb.1.10".to_string(),
            first_player: "Tiziano".to_string(),
            second_player: "sleepywind".to_string(),
            name: " game #1301977".to_string(),
            source: "http://www.littlegolem.com".to_string(),
        }
    }

    #[test]
    fn writes_header_and_linear_moves() {
        let mut producer = Linear {
            records: vec![
                Record {
                    color: Color::First,
                    mv: Move::Place(Point::new(11, 11)),
                },
                Record {
                    color: Color::Second,
                    mv: Move::Swap,
                },
                Record {
                    color: Color::First,
                    mv: Move::Place(Point::new(6, 6)),
                },
            ],
            pos: 0,
        };
        assert_eq!(
            write_record(&header(), &mut producer).unwrap(),
            "(;FF[4]EV[hex.mc.2011.feb.1.10]PB[Tiziano]PW[sleepywind]SZ[13]GC[ game #1301977]SO[http://www.littlegolem.com];W[ll];B[swap];W[gg])"
        );
    }

    #[test]
    fn escapes_metadata() {
        let info = GameInfo {
            event: r"a]b\c".to_string(),
            ..GameInfo::new(13)
        };
        let mut producer = Linear {
            records: Vec::new(),
            pos: 0,
        };
        let out = write_record(&info, &mut producer).unwrap();
        assert!(out.contains(r"EV[a\]b\\c]"), "{}", out);
    }

    #[test]
    fn nested_variations_close_together() {
        let mut game = Game::new(13).unwrap();
        let p = &mut NullPresenter;
        let place = |x, y| Move::Place(Point::new(x, y));
        let a = game.play_move(place(0, 0), Color::First, p).unwrap();
        let b = game.play_move(place(1, 1), Color::Second, p).unwrap();
        game.play_move(place(2, 2), Color::First, p).unwrap();
        game.jump_to(b, p).unwrap();
        game.play_move(place(3, 3), Color::First, p).unwrap();
        game.jump_to(a, p).unwrap();
        game.play_move(place(4, 4), Color::Second, p).unwrap();

        let out = write_game(&game).unwrap();
        let moves = &out[out.find(";W[aa]").unwrap()..];
        assert_eq!(moves, ";W[aa](;B[bb](;W[cc])(;W[dd]))(;B[ee]))");
    }
}
