//! Piece placement plus the rules-engine view of it.

use chess_grid_core::{
    BoardSquare, Orientation, Piece, PieceColor, PieceKind, SquareIndex, BOARD_SQUARES,
};
use shakmaty::fen::Fen;
use shakmaty::{
    attacks, Bitboard, Board, CastlingMode, Chess, Color, File, FromSetup, Move, PositionError,
    Rank, Role, Setup, Square,
};

/// Glyph printed for an empty square in [`BoardPosition::render`].
pub const EMPTY_GLYPH: char = '_';

/// Position rebuilt from one still image.
///
/// The image carries no history, so every rebuilt position has white to
/// move and all four castling rights; rights that the placement makes
/// impossible are dropped when the rules engine validates it.
#[derive(Clone, Debug)]
pub struct BoardPosition {
    setup: Setup,
}

impl Default for BoardPosition {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoardPosition {
    pub fn empty() -> Self {
        Self::from_pieces(std::iter::empty())
    }

    pub fn from_pieces<I>(pieces: I) -> Self
    where
        I: IntoIterator<Item = (BoardSquare, Piece)>,
    {
        let mut board = Board::empty();
        for (square, piece) in pieces {
            board.set_piece_at(to_engine_square(square), to_engine_piece(piece));
        }

        let mut setup = Setup::empty();
        setup.board = board;
        setup.turn = Color::White;
        setup.castling_rights =
            Bitboard::from_iter([Square::A1, Square::H1, Square::A8, Square::H8]);
        Self { setup }
    }

    pub fn piece_at(&self, square: BoardSquare) -> Option<Piece> {
        self.setup
            .board
            .piece_at(to_engine_square(square))
            .map(from_engine_piece)
    }

    /// Occupied squares, a1 to h8.
    pub fn pieces(&self) -> Vec<(BoardSquare, Piece)> {
        (0..BOARD_SQUARES as u8)
            .flat_map(|rank| {
                (0..BOARD_SQUARES as u8).filter_map(move |file| BoardSquare::new(file, rank))
            })
            .filter_map(|sq| self.piece_at(sq).map(|p| (sq, p)))
            .collect()
    }

    pub fn piece_count(&self) -> usize {
        self.setup.board.occupied().count()
    }

    /// Full FEN: placement, white to move, `KQkq`, no en passant.
    pub fn fen(&self) -> String {
        Fen::from_setup(self.setup.clone()).to_string()
    }

    /// Rows as rendered on screen, glyphs separated by spaces.
    ///
    /// Glyph colors are inverted so pieces read correctly on a dark
    /// terminal: white pieces use the filled glyphs.
    pub fn render(&self, orientation: Orientation) -> String {
        let mut rows = Vec::with_capacity(BOARD_SQUARES);
        for row in 0..BOARD_SQUARES {
            let line: Vec<String> = (0..BOARD_SQUARES)
                .filter_map(|col| SquareIndex::new(row, col))
                .map(|idx| {
                    self.piece_at(orientation.to_square(idx))
                        .map_or(EMPTY_GLYPH, inverted_glyph)
                        .to_string()
                })
                .collect();
            rows.push(line.join(" "));
        }
        rows.join("\n")
    }

    /// Rules-engine position with `turn` to move.
    ///
    /// Castling rights that do not match the placement are dropped. Extra
    /// material and impossible checks, both symptoms of a misclassified
    /// square, are tolerated.
    pub(crate) fn to_engine(&self, turn: PieceColor) -> Result<Chess, PositionError<Chess>> {
        let mut setup = self.setup.clone();
        setup.turn = to_engine_color(turn);
        setup.ep_square = None;
        Chess::from_setup(setup, CastlingMode::Standard)
            .or_else(PositionError::ignore_invalid_castling_rights)
            .or_else(PositionError::ignore_too_much_material)
            .or_else(PositionError::ignore_impossible_check)
    }

    /// Moves for `turn` that ignore check, en passant and promotion.
    ///
    /// Used when the rules engine refuses the placement, typically because a
    /// king was not recognised or a pawn was misread onto a back rank.
    /// Castling is offered when king and rook stand on their home squares
    /// with nothing between them.
    pub(crate) fn pseudo_legal_moves(&self, turn: PieceColor) -> Vec<Move> {
        let board = &self.setup.board;
        let color = to_engine_color(turn);
        let own = board.by_color(color);
        let mut moves = Vec::new();

        for from in own {
            let Some(role) = board.role_at(from) else {
                continue;
            };
            let targets = if role == Role::Pawn {
                board.attacks_from(from) & board.by_color(!color)
            } else {
                board.attacks_from(from) & !own
            };
            for to in targets {
                moves.push(Move::Normal {
                    role,
                    from,
                    capture: board.role_at(to),
                    to,
                    promotion: None,
                });
            }
            if role == Role::Pawn {
                moves.extend(pawn_pushes(board, color, from));
            }
        }

        moves.extend(home_castles(board, color));
        moves
    }
}

fn pawn_pushes(board: &Board, color: Color, from: Square) -> Vec<Move> {
    let (step, start) = match color {
        Color::White => (8, Rank::Second),
        Color::Black => (-8, Rank::Seventh),
    };
    let push = |to: Square| Move::Normal {
        role: Role::Pawn,
        from,
        capture: None,
        to,
        promotion: None,
    };

    let mut out = Vec::new();
    let Some(single) = from.offset(step).filter(|&to| board.piece_at(to).is_none()) else {
        return out;
    };
    out.push(push(single));
    if from.rank() == start {
        if let Some(double) = single.offset(step).filter(|&to| board.piece_at(to).is_none()) {
            out.push(push(double));
        }
    }
    out
}

fn home_castles(board: &Board, color: Color) -> Vec<Move> {
    let (king, rooks) = match color {
        Color::White => (Square::E1, [Square::H1, Square::A1]),
        Color::Black => (Square::E8, [Square::H8, Square::A8]),
    };
    let home =
        |sq: Square, role: Role| board.piece_at(sq) == Some(shakmaty::Piece { color, role });
    if !home(king, Role::King) {
        return Vec::new();
    }
    rooks
        .into_iter()
        .filter(|&rook| home(rook, Role::Rook))
        .filter(|&rook| (attacks::between(king, rook) & board.occupied()).is_empty())
        .map(|rook| Move::Castle { king, rook })
        .collect()
}

pub(crate) fn to_engine_square(square: BoardSquare) -> Square {
    Square::from_coords(
        File::new(u32::from(square.file())),
        Rank::new(u32::from(square.rank())),
    )
}

pub(crate) fn from_engine_square(square: Square) -> Option<BoardSquare> {
    BoardSquare::from_chars(square.file().char(), square.rank().char())
}

fn to_engine_color(color: PieceColor) -> Color {
    match color {
        PieceColor::White => Color::White,
        PieceColor::Black => Color::Black,
    }
}

fn to_engine_piece(piece: Piece) -> shakmaty::Piece {
    let role = match piece.kind {
        PieceKind::Pawn => Role::Pawn,
        PieceKind::Knight => Role::Knight,
        PieceKind::Bishop => Role::Bishop,
        PieceKind::Rook => Role::Rook,
        PieceKind::Queen => Role::Queen,
        PieceKind::King => Role::King,
    };
    shakmaty::Piece {
        color: to_engine_color(piece.color),
        role,
    }
}

fn from_engine_piece(piece: shakmaty::Piece) -> Piece {
    let kind = match piece.role {
        Role::Pawn => PieceKind::Pawn,
        Role::Knight => PieceKind::Knight,
        Role::Bishop => PieceKind::Bishop,
        Role::Rook => PieceKind::Rook,
        Role::Queen => PieceKind::Queen,
        Role::King => PieceKind::King,
    };
    let color = match piece.color {
        Color::White => PieceColor::White,
        Color::Black => PieceColor::Black,
    };
    Piece::new(color, kind)
}

fn inverted_glyph(piece: Piece) -> char {
    match (piece.color, piece.kind) {
        (PieceColor::White, PieceKind::King) => '♚',
        (PieceColor::White, PieceKind::Queen) => '♛',
        (PieceColor::White, PieceKind::Rook) => '♜',
        (PieceColor::White, PieceKind::Bishop) => '♝',
        (PieceColor::White, PieceKind::Knight) => '♞',
        (PieceColor::White, PieceKind::Pawn) => '♟',
        (PieceColor::Black, PieceKind::King) => '♔',
        (PieceColor::Black, PieceKind::Queen) => '♕',
        (PieceColor::Black, PieceKind::Rook) => '♖',
        (PieceColor::Black, PieceKind::Bishop) => '♗',
        (PieceColor::Black, PieceKind::Knight) => '♘',
        (PieceColor::Black, PieceKind::Pawn) => '♙',
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn starting_pieces() -> Vec<(BoardSquare, Piece)> {
        let back = "RNBQKBNR";
        let mut out = Vec::new();
        for (file, symbol) in back.chars().enumerate() {
            let file = file as u8;
            let push = |out: &mut Vec<_>, rank: u8, c: char| {
                if let (Some(sq), Some(p)) = (BoardSquare::new(file, rank), Piece::from_symbol(c)) {
                    out.push((sq, p));
                }
            };
            push(&mut out, 0, symbol);
            push(&mut out, 1, 'P');
            push(&mut out, 6, 'p');
            push(&mut out, 7, symbol.to_ascii_lowercase());
        }
        out
    }

    #[test]
    fn starting_fen_has_all_rights() {
        let pos = BoardPosition::from_pieces(starting_pieces());
        assert_eq!(pos.piece_count(), 32);
        assert_eq!(
            pos.fen(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
    }

    #[test]
    fn render_follows_orientation() {
        let e1: BoardSquare = "e1".parse().expect("square");
        let a8: BoardSquare = "a8".parse().expect("square");
        let pos = BoardPosition::from_pieces([
            (e1, Piece::new(PieceColor::White, PieceKind::King)),
            (a8, Piece::new(PieceColor::Black, PieceKind::Rook)),
        ]);

        let normal = pos.render(Orientation::Normal);
        let lines: Vec<&str> = normal.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "♖ _ _ _ _ _ _ _");
        assert_eq!(lines[7], "_ _ _ _ ♚ _ _ _");

        let flipped = pos.render(Orientation::Flipped);
        let lines: Vec<&str> = flipped.lines().collect();
        assert_eq!(lines[0], "_ _ _ ♚ _ _ _ _");
        assert_eq!(lines[7], "_ _ _ _ _ _ _ ♖");
    }

    #[test]
    fn squares_convert_both_ways() {
        for text in ["a1", "e4", "h8", "c7"] {
            let sq: BoardSquare = text.parse().expect("square");
            assert_eq!(from_engine_square(to_engine_square(sq)), Some(sq));
            assert_eq!(to_engine_square(sq).to_string(), text);
        }
    }

    #[test]
    fn misplaced_rooks_drop_castling_rights() {
        let pieces = [("e1", 'K'), ("e8", 'k'), ("b1", 'R')];
        let pos = BoardPosition::from_pieces(pieces.iter().filter_map(|&(s, c)| {
            Some((s.parse::<BoardSquare>().ok()?, Piece::from_symbol(c)?))
        }));
        assert!(pos.to_engine(PieceColor::White).is_ok());
    }
}
