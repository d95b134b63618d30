//! Move identities and the move algebra.
//!
//! A move is a twist of one face's outer layer or of the inner slice under
//! it, measured in clockwise clicks of 72°. Five clicks are the identity,
//! so a move stores 1..=4 clicks and its inverse is `5 - clicks`. Notation
//! follows the face names with an `s` suffix for slices: `F`, `F2`, `F2'`,
//! `F'`, `Fs`, `Fs2`, `Fs2'`, `Fs'`.

use crate::faces::Face;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which layer of the face's axis a move twists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
    Outer,
    Slice,
}

/// A single twist. Construction is checked: a clicks value outside 1..=4 is
/// a programming fault, not an input error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Move {
    face: Face,
    layer: Layer,
    clicks: u8,
}

/// Rotation sense of an externally visible move token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

/// The structured move record handed to external collaborators: a face or
/// slice layer, a rotation amount in clicks (1 or 2), and a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveToken {
    pub face: Face,
    pub layer: Layer,
    pub rotation_amount: u8,
    pub direction: Direction,
}

impl Move {
    /// # Panics
    ///
    /// If `clicks` is not in `1..=4`.
    #[must_use]
    pub fn new(face: Face, layer: Layer, clicks: u8) -> Move {
        assert!((1..=4).contains(&clicks), "clicks must be in 1..=4");
        Move {
            face,
            layer,
            clicks,
        }
    }

    #[must_use]
    pub fn face(self) -> Face {
        self.face
    }

    #[must_use]
    pub fn layer(self) -> Layer {
        self.layer
    }

    /// Clockwise clicks, 1..=4.
    #[must_use]
    pub fn clicks(self) -> u8 {
        self.clicks
    }

    /// The move that undoes this one.
    #[must_use]
    pub fn inverse(self) -> Move {
        Move {
            face: self.face,
            layer: self.layer,
            clicks: 5 - self.clicks,
        }
    }

    #[must_use]
    pub fn token(self) -> MoveToken {
        let (rotation_amount, direction) = match self.clicks {
            1 => (1, Direction::Clockwise),
            2 => (2, Direction::Clockwise),
            3 => (2, Direction::CounterClockwise),
            _ => (1, Direction::CounterClockwise),
        };
        MoveToken {
            face: self.face,
            layer: self.layer,
            rotation_amount,
            direction,
        }
    }

    /// # Panics
    ///
    /// If the token's rotation amount is not 1 or 2.
    #[must_use]
    pub fn from_token(token: MoveToken) -> Move {
        assert!(
            (1..=2).contains(&token.rotation_amount),
            "rotation amount must be 1 or 2"
        );
        let clicks = match token.direction {
            Direction::Clockwise => token.rotation_amount,
            Direction::CounterClockwise => 5 - token.rotation_amount,
        };
        Move::new(token.face, token.layer, clicks)
    }

    /// All 96 distinct moves, outer twists first, in face order.
    pub fn all() -> impl Iterator<Item = Move> {
        [Layer::Outer, Layer::Slice].into_iter().flat_map(|layer| {
            Face::ALL
                .into_iter()
                .flat_map(move |face| (1..=4).map(move |clicks| Move::new(face, layer, clicks)))
        })
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseMoveError {
    #[error("empty move token")]
    Empty,
    #[error("no such face in {0:?}")]
    UnknownFace(String),
    #[error("bad rotation suffix in {0:?} (expected nothing, 2, 2' or ')")]
    BadSuffix(String),
}

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Move, ParseMoveError> {
        if s.is_empty() {
            return Err(ParseMoveError::Empty);
        }
        // Longest face name first: "BR2'" must not parse as B + garbage.
        let (face, mut rest) = if let Some(prefix) = s.get(..2)
            && let Some(face) = Face::parse(prefix)
        {
            (face, &s[2..])
        } else if let Some(prefix) = s.get(..1)
            && let Some(face) = Face::parse(prefix)
        {
            (face, &s[1..])
        } else {
            return Err(ParseMoveError::UnknownFace(s.to_owned()));
        };
        let layer = if let Some(stripped) = rest.strip_prefix('s') {
            rest = stripped;
            Layer::Slice
        } else {
            Layer::Outer
        };
        let clicks = match rest {
            "" => 1,
            "2" => 2,
            "2'" => 3,
            "'" => 4,
            _ => return Err(ParseMoveError::BadSuffix(s.to_owned())),
        };
        Ok(Move::new(face, layer, clicks))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.face.name())?;
        if self.layer == Layer::Slice {
            f.write_str("s")?;
        }
        f.write_str(match self.clicks {
            1 => "",
            2 => "2",
            3 => "2'",
            _ => "'",
        })
    }
}

/// Cancel redundant adjacent moves: consecutive twists of the same face and
/// layer merge modulo five clicks, and merges that reach the identity drop
/// out entirely (which can cascade into further merges).
#[must_use]
pub fn simplify(moves: &[Move]) -> Vec<Move> {
    let mut out: Vec<Move> = Vec::with_capacity(moves.len());
    for &mv in moves {
        match out.last() {
            Some(&last) if last.face == mv.face && last.layer == mv.layer => {
                let clicks = (last.clicks + mv.clicks) % 5;
                out.pop();
                if clicks != 0 {
                    out.push(Move::new(mv.face, mv.layer, clicks));
                }
            }
            _ => out.push(mv),
        }
    }
    out
}

/// The sequence undoing `moves`: reversed order, each move inverted.
#[must_use]
pub fn sequence_inverse(moves: &[Move]) -> Vec<Move> {
    moves.iter().rev().map(|mv| mv.inverse()).collect()
}

/// Parse a whitespace-separated algorithm string such as `"F U2 Rs' BL2'"`.
///
/// # Errors
///
/// On the first token that is not a move.
pub fn parse_sequence(algorithm: &str) -> Result<Vec<Move>, ParseMoveError> {
    algorithm.split_whitespace().map(str::parse).collect()
}

/// Format a move sequence as an algorithm string.
#[must_use]
pub fn format_sequence(moves: &[Move]) -> String {
    moves
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
