//! Text rendering of the board view.

use crate::board::BOARD_SIZE;
use crate::view::{BoardView, Cell};

pub const LOADING: &str = "Loading...";

/// How pieces are drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GlyphStyle {
    #[default]
    Unicode,
    Ascii,
}

/// Renders the grid with rank labels on the left and files underneath.
/// Selected cells are bracketed `[ ]`, valid destinations use `( )` or `*`.
pub fn render_view(view: &BoardView, style: GlyphStyle) -> String {
    if view.board().is_none() {
        return format!("{}\n", LOADING);
    }

    let size = usize::from(BOARD_SIZE);
    let mut grid = vec![vec![String::from(" . "); size]; size];
    for cell in view.cells() {
        grid[usize::from(cell.display_row)][usize::from(cell.display_col)] = cell_text(&cell, style);
    }

    let mut output = String::new();
    for (line, cells) in grid.iter().enumerate() {
        // Top line is rank 8
        output.push_str(&format!("{} ", size - line));
        for text in cells {
            output.push_str(text);
        }
        output.push('\n');
    }

    output.push_str("  ");
    for col in 0..BOARD_SIZE {
        output.push_str(&format!(" {} ", char::from(b'a' + col)));
    }
    output.push('\n');

    match view.selection() {
        Some(pos) => output.push_str(&format!(
            "selected: {} ({},{}), {} valid moves\n",
            pos,
            pos.row(),
            pos.col(),
            view.valid_moves().len()
        )),
        None => output.push_str("selected: none\n"),
    }

    output
}

/// Keeps the last frame so an unchanged view is not drawn again.
#[derive(Debug, Default)]
pub struct Screen {
    last: String,
}

impl Screen {
    /// The frame to draw, or `None` when it matches the previous one.
    pub fn frame(&mut self, view: &BoardView, style: GlyphStyle) -> Option<&str> {
        let next = render_view(view, style);
        if next == self.last {
            return None;
        }
        self.last = next;
        Some(&self.last)
    }
}

fn cell_text(cell: &Cell<'_>, style: GlyphStyle) -> String {
    let glyph = cell.piece.glyph(style == GlyphStyle::Ascii);
    match (cell.selected, cell.valid_move, glyph) {
        (true, _, Some(g)) => format!("[{}]", g),
        (true, _, None) => "[ ]".to_string(),
        (false, true, Some(g)) => format!("({})", g),
        (false, true, None) => " * ".to_string(),
        (false, false, Some(g)) => format!(" {} ", g),
        (false, false, None) => " . ".to_string(),
    }
}
