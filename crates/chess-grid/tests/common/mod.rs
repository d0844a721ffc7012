//! Synthetic screenshots of a flat-shaded board.
//!
//! The screen is black. The board is a 320 px square of mid gray (neither
//! light nor dark under the default cutoffs) at `BOARD_ORIGIN`. Each piece
//! kind is drawn as a 16×32 bar whose horizontal offset depends on the kind,
//! white pieces at 255 and black pieces at 20.

#![allow(dead_code)]

use chess_grid::core::{BoardSquare, Orientation, Piece, MATCH_PRIORITY};
use image::{Rgba, RgbaImage};

pub const SCREEN: (u32, u32) = (500, 400);
pub const BOARD_ORIGIN: (u32, u32) = (50, 30);
pub const BOARD_SIDE: u32 = 320;
pub const SQUARE: u32 = BOARD_SIDE / 8;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

const BOARD_GRAY: u8 = 120;
const WHITE_PIECE: u8 = 255;
const BLACK_PIECE: u8 = 20;

pub fn sq(text: &str) -> BoardSquare {
    text.parse().expect("square")
}

/// Pieces listed as `("e1", 'K')` pairs.
pub fn pieces(list: &[(&str, char)]) -> Vec<(BoardSquare, Piece)> {
    list.iter()
        .map(|&(s, c)| (sq(s), Piece::from_symbol(c).expect("symbol")))
        .collect()
}

pub fn start_pieces() -> Vec<(BoardSquare, Piece)> {
    let back = ['r', 'n', 'b', 'q', 'k', 'b', 'n', 'r'];
    let mut out = Vec::new();
    for (file, &symbol) in back.iter().enumerate() {
        let file = file as u8;
        for (rank, c) in [
            (0, symbol.to_ascii_uppercase()),
            (1, 'P'),
            (6, 'p'),
            (7, symbol),
        ] {
            let square = BoardSquare::new(file, rank).expect("square");
            out.push((square, Piece::from_symbol(c).expect("symbol")));
        }
    }
    out
}

/// Start position with the given squares moved, e.g. `[("e2", "e4")]`.
pub fn start_with_moves(moves: &[(&str, &str)]) -> Vec<(BoardSquare, Piece)> {
    let mut out = start_pieces();
    for &(from, to) in moves {
        let (from, to) = (sq(from), sq(to));
        out.retain(|&(s, _)| s != to);
        for entry in out.iter_mut() {
            if entry.0 == from {
                entry.0 = to;
            }
        }
    }
    out
}

fn fill(img: &mut RgbaImage, x0: u32, y0: u32, w: u32, h: u32, v: u8) {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            img.put_pixel(x, y, Rgba([v, v, v, 255]));
        }
    }
}

/// Screen with the board rendered for `orientation`.
pub fn render_screen(pieces: &[(BoardSquare, Piece)], orientation: Orientation) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(SCREEN.0, SCREEN.1, Rgba([0, 0, 0, 255]));
    let (bx, by) = BOARD_ORIGIN;
    fill(&mut img, bx, by, BOARD_SIDE, BOARD_SIDE, BOARD_GRAY);

    for &(square, piece) in pieces {
        let index = orientation.to_index(square);
        let kind = MATCH_PRIORITY
            .iter()
            .position(|&k| k == piece.kind)
            .expect("kind") as u32;
        let value = match piece.color {
            chess_grid::PieceColor::White => WHITE_PIECE,
            chess_grid::PieceColor::Black => BLACK_PIECE,
        };
        let x = bx + index.col() as u32 * SQUARE + 4 + 4 * kind;
        let y = by + index.row() as u32 * SQUARE + 4;
        fill(&mut img, x, y, 16, 32, value);
    }
    img
}

/// Screen center of a square for a board at `origin`.
pub fn center(origin: (u32, u32), square: &str, orientation: Orientation) -> (i32, i32) {
    let index = orientation.to_index(sq(square));
    (
        (origin.0 + index.col() as u32 * SQUARE + SQUARE / 2) as i32,
        (origin.1 + index.row() as u32 * SQUARE + SQUARE / 2) as i32,
    )
}

pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}
