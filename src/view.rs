//! Board view state.
//! Three fields (board, selection, valid moves) updated only through `apply`.
//! Updates are pure: they never perform I/O. When an event calls for fresh
//! data, `apply` hands back a `FetchRequest` for the caller to run.

use crate::board::{BOARD_SIZE, Board, Piece, Position};
use std::fmt;
use tracing::{debug, error};

/// What to do with a response from a fetch cycle that has been superseded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StalePolicy {
    /// Last arrival wins, even when it answers an older selection.
    #[default]
    Apply,
    /// Last triggered wins: responses from older cycles are dropped.
    Discard,
}

impl fmt::Display for StalePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StalePolicy::Apply => write!(f, "apply"),
            StalePolicy::Discard => write!(f, "discard"),
        }
    }
}

/// Which retrieval of a cycle an outcome belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Retrieval {
    Board,
    Moves(Position),
}

impl fmt::Display for Retrieval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Retrieval::Board => write!(f, "board"),
            Retrieval::Moves(at) => write!(f, "valid moves for {}", at),
        }
    }
}

#[derive(Debug)]
pub enum Event {
    BoardArrived { token: u64, board: Board },
    MovesArrived { token: u64, at: Position, moves: Vec<Position> },
    RetrievalFailed { token: u64, what: Retrieval, error: anyhow::Error },
    CellClicked(Position),
    Refresh,
}

/// One fetch cycle to run: board, then moves for `selection` if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    pub token: u64,
    pub selection: Option<Position>,
}

/// A board entry with its screen placement and highlight flags.
#[derive(Clone, Copy, Debug)]
pub struct Cell<'a> {
    pub piece: &'a Piece,
    /// 0 is the top line, which shows row 7.
    pub display_row: u8,
    pub display_col: u8,
    pub selected: bool,
    pub valid_move: bool,
}

#[derive(Debug, Default)]
pub struct BoardView {
    board: Option<Board>,
    selection: Option<Position>,
    valid_moves: Vec<Position>,
    policy: StalePolicy,
    issued: u64,
}

impl BoardView {
    pub fn new(policy: StalePolicy) -> Self {
        BoardView { policy, ..Default::default() }
    }

    /// Fetch cycle for the initial mount.
    pub fn start(&mut self) -> FetchRequest {
        self.issue()
    }

    pub fn apply(&mut self, event: Event) -> Option<FetchRequest> {
        match event {
            Event::CellClicked(pos) => {
                self.selection = Some(pos);
                Some(self.issue())
            }
            Event::Refresh => Some(self.issue()),
            Event::BoardArrived { token, board } => {
                if self.accepts(token) {
                    self.board = Some(board);
                }
                None
            }
            Event::MovesArrived { token, at, moves } => {
                if self.accepts(token) {
                    debug!(token, %at, count = moves.len(), "valid moves replaced");
                    self.valid_moves = moves;
                }
                None
            }
            Event::RetrievalFailed { token, what, error } => {
                error!(token, "Error fetching {}: {:#}", what, error);
                None
            }
        }
    }

    fn issue(&mut self) -> FetchRequest {
        self.issued += 1;
        FetchRequest { token: self.issued, selection: self.selection }
    }

    fn accepts(&self, token: u64) -> bool {
        if token >= self.issued {
            return true;
        }
        match self.policy {
            StalePolicy::Apply => {
                debug!(token, latest = self.issued, "applying response from superseded fetch");
                true
            }
            StalePolicy::Discard => {
                debug!(token, latest = self.issued, "dropping response from superseded fetch");
                false
            }
        }
    }

    /// True until the first board has arrived.
    pub fn is_loading(&self) -> bool {
        self.board.is_none()
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn selection(&self) -> Option<Position> {
        self.selection
    }

    pub fn valid_moves(&self) -> &[Position] {
        &self.valid_moves
    }

    /// One cell per board entry, empty while loading.
    pub fn cells(&self) -> Vec<Cell<'_>> {
        let Some(board) = &self.board else {
            return Vec::new();
        };
        board
            .pieces()
            .iter()
            .map(|piece| {
                let pos = piece.position;
                Cell {
                    piece,
                    display_row: BOARD_SIZE - 1 - pos.row(),
                    display_col: pos.col(),
                    selected: self.selection == Some(pos),
                    valid_move: self.valid_moves.contains(&pos),
                }
            })
            .collect()
    }
}
