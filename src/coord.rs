use crate::error::{Error, Result};
use crate::tree::{MoveKind, Node};
use serde::Serialize;

/// Letters used for both axes of a coordinate token, in index order.
pub const ALPHABET: &[u8; 26] = b"abcdefghijklmnopqrstuvwxyz";

/// A cell on the board, 0-based on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Point {
    pub x: u8,
    pub y: u8,
}

impl Point {
    pub fn new(x: u8, y: u8) -> Self {
        Point { x, y }
    }

    pub fn on_board(&self, size: u8) -> bool {
        self.x < size && self.y < size
    }
}

/// Every coordinate on a board of `size` must be expressible with the alphabet.
pub fn check_board_size(size: u8) -> Result<()> {
    if size == 0 || size as usize > ALPHABET.len() {
        return Err(Error::InvalidConfiguration {
            message: format!("board size {} is outside 1..={}", size, ALPHABET.len()),
        });
    }
    Ok(())
}

/// Encode a point as its two-letter token, `x` first.
pub fn encode(point: Point) -> Result<String> {
    let letter = |i: u8| {
        ALPHABET
            .get(i as usize)
            .map(|&b| b as char)
            .ok_or_else(|| Error::InvalidCoordinate {
                token: format!("{},{}", point.x, point.y),
            })
    };
    Ok([letter(point.x)?, letter(point.y)?].iter().collect())
}

/// Decode a two-letter token back into a point.
pub fn decode(token: &str) -> Result<Point> {
    let invalid = || Error::InvalidCoordinate {
        token: token.to_string(),
    };
    let bytes = token.as_bytes();
    if bytes.len() != 2 {
        return Err(invalid());
    }
    let index = |b: u8| {
        ALPHABET
            .iter()
            .position(|&a| a == b)
            .map(|i| i as u8)
            .ok_or_else(invalid)
    };
    Ok(Point::new(index(bytes[0])?, index(bytes[1])?))
}

/// Label shown for a node in the move list.
pub fn view_label(node: &Node) -> String {
    match (node.kind, node.point) {
        (MoveKind::Root, _) => "root".to_string(),
        (MoveKind::Swap, _) => format!("{}.swap", node.number),
        (MoveKind::Resign, _) => format!("{}.resign", node.number),
        (MoveKind::Normal, Some(point)) => match encode(point) {
            Ok(token) => format!("{}.{}", node.number, token),
            Err(_) => format!("{}.?", node.number),
        },
        (MoveKind::Normal, None) => format!("{}.?", node.number),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_x_then_y() {
        assert_eq!(encode(Point::new(0, 0)).unwrap(), "aa");
        assert_eq!(encode(Point::new(11, 6)).unwrap(), "lg");
        assert_eq!(encode(Point::new(25, 25)).unwrap(), "zz");
    }

    #[test]
    fn encode_rejects_points_past_the_alphabet() {
        let err = encode(Point::new(26, 0)).unwrap_err();
        assert_eq!(err.code(), "invalid-coordinate");
    }

    #[test]
    fn decode_inverts_encode() {
        assert_eq!(decode("ll").unwrap(), Point::new(11, 11));
        assert_eq!(decode("ga").unwrap(), Point::new(6, 0));
    }

    #[test]
    fn decode_rejects_malformed_tokens() {
        for token in ["", "a", "abc", "A1", "a!", "é"] {
            assert!(
                matches!(decode(token), Err(Error::InvalidCoordinate { .. })),
                "token {:?} should be rejected",
                token
            );
        }
    }
}
