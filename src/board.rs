//! Board data model.
//! The server sends the position as a flat list of 64 entries, one per square.
//! Empty squares are explicit entries with color "empty".
//! Piece kinds reuse `shakmaty::Role`; the board itself is not a shakmaty board
//! because legality lives on the server.

use anyhow::{Result, bail};
use serde::{Deserialize, Deserializer};
use shakmaty::Role;
use std::fmt;

pub const BOARD_SIZE: u8 = 8;
pub const SQUARE_COUNT: usize = 64;

/// Square coordinates as `(row, col)`, serialized as `[row, col]`.
/// Row 0 is rank 1, col 0 is file a.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Position(pub u8, pub u8);

impl Position {
    /// Checked constructor, `None` when either coordinate is off the board.
    pub fn new(row: u8, col: u8) -> Option<Position> {
        let pos = Position(row, col);
        pos.in_bounds().then_some(pos)
    }

    pub fn row(self) -> u8 {
        self.0
    }

    pub fn col(self) -> u8 {
        self.1
    }

    pub fn in_bounds(self) -> bool {
        self.0 < BOARD_SIZE && self.1 < BOARD_SIZE
    }

    /// Row-major index, matches `shakmaty::Square` numbering.
    pub fn index(self) -> usize {
        usize::from(self.0) * usize::from(BOARD_SIZE) + usize::from(self.1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", char::from(b'a' + self.1), self.0 + 1)
    }
}

/// Color field of a board entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Black,
    White,
    Empty,
}

/// One board entry as the server sends it.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Piece {
    pub color: Side,
    pub position: Position,
    /// Ignored for empty squares, the server may send anything there.
    #[serde(rename = "piece", default, deserialize_with = "lenient_role")]
    pub role: Option<Role>,
}

fn lenient_role<'de, D>(deserializer: D) -> std::result::Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(|s| {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Role::from_char(c),
            _ => None,
        }
    }))
}

impl Piece {
    pub fn is_empty(&self) -> bool {
        self.color == Side::Empty || self.role.is_none()
    }

    /// Unicode chess glyph, or the FEN letter when `ascii` is set.
    /// Empty squares have no glyph.
    pub fn glyph(&self, ascii: bool) -> Option<char> {
        if self.is_empty() {
            return None;
        }
        let role = self.role?;
        let glyph = match (self.color, ascii) {
            (Side::Empty, _) => return None,
            (Side::White, true) => role.upper_char(),
            (Side::Black, true) => role.char(),
            (Side::White, false) => match role {
                Role::King => '♔',
                Role::Queen => '♕',
                Role::Rook => '♖',
                Role::Bishop => '♗',
                Role::Knight => '♘',
                Role::Pawn => '♙',
            },
            (Side::Black, false) => match role {
                Role::King => '♚',
                Role::Queen => '♛',
                Role::Rook => '♜',
                Role::Bishop => '♝',
                Role::Knight => '♞',
                Role::Pawn => '♟',
            },
        };
        Some(glyph)
    }
}

/// A full position: exactly one entry per square.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    pieces: Vec<Piece>,
}

impl Board {
    /// Validates a server response. Any violation counts as a failed retrieval.
    pub fn from_pieces(pieces: Vec<Piece>) -> Result<Board> {
        if pieces.len() != SQUARE_COUNT {
            bail!("Board has {} entries, expected {}", pieces.len(), SQUARE_COUNT);
        }

        let mut seen = [false; SQUARE_COUNT];
        for piece in &pieces {
            let pos = piece.position;
            if !pos.in_bounds() {
                bail!("Board entry at ({}, {}) is off the board", pos.row(), pos.col());
            }
            if std::mem::replace(&mut seen[pos.index()], true) {
                bail!("Board has more than one entry for {}", pos);
            }
            if piece.color != Side::Empty && piece.role.is_none() {
                bail!("Occupied square {} has no recognizable piece kind", pos);
            }
        }

        Ok(Board { pieces })
    }

    /// Entries in server order.
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }
}

/// Checks a moves response. Off-board squares count as a failed retrieval.
pub fn validate_moves(moves: Vec<Position>) -> Result<Vec<Position>> {
    if let Some(pos) = moves.iter().find(|p| !p.in_bounds()) {
        bail!("Move target ({}, {}) is off the board", pos.row(), pos.col());
    }
    Ok(moves)
}
