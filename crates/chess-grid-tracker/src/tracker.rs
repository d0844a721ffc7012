use crate::notation::normalize_notation;
use crate::position::{from_engine_square, BoardPosition};
use chess_grid_core::{BoardSquare, Orientation, PieceColor};
use chess_grid_detect::BoardClassification;
use shakmaty::san::San;
use shakmaty::{File, Move, Square};
use std::fmt;

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("invalid move: {notation}")]
    InvalidMoveNotation { notation: String },
}

/// Squares to click for a resolved move. Castling uses the king's squares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveSquares {
    pub from: BoardSquare,
    pub to: BoardSquare,
    /// Normalized SAN the move was parsed from.
    pub san: String,
    /// Side the move was resolved for.
    pub mover: PieceColor,
}

impl fmt::Display for MoveSquares {
    /// Coordinate form, e.g. `e2e4`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

/// Keeps the position rebuilt from the last detection pass.
#[derive(Clone, Debug, Default)]
pub struct BoardStateTracker {
    position: BoardPosition,
    orientation: Orientation,
}

impl BoardStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn position(&self) -> &BoardPosition {
        &self.position
    }

    #[inline]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Replace the tracked position with the classified pieces.
    ///
    /// Unclassified squares are left empty.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, classification))
    )]
    pub fn rebuild(
        &mut self,
        classification: &BoardClassification,
        orientation: Orientation,
    ) -> &BoardPosition {
        self.orientation = orientation;
        self.position = BoardPosition::from_pieces(classification.pieces(orientation));

        let unclassified = classification.unclassified_count();
        if unclassified > 0 {
            log::debug!("{unclassified} covered squares matched no signature and were left empty");
        }
        log::info!(
            "position rebuilt with {} pieces:\n{}",
            self.position.piece_count(),
            self.position.render(orientation)
        );
        &self.position
    }

    /// Resolve spoken move tokens against the tracked position.
    ///
    /// The position has no memory of whose turn it is, so the move is
    /// parsed with `hint` to move first and, if that fails, with the other
    /// side to move. The tracked position is not changed.
    pub fn apply_move<S: AsRef<str>>(
        &self,
        tokens: &[S],
        hint: PieceColor,
    ) -> Result<MoveSquares, TrackerError> {
        let notation = normalize_notation(tokens);
        let invalid = || TrackerError::InvalidMoveNotation {
            notation: notation.clone(),
        };

        let san: San = match notation.parse() {
            Ok(san) => san,
            Err(err) => {
                log::warn!("invalid move: {notation} ({err})");
                return Err(invalid());
            }
        };

        for mover in [hint, opposite(hint)] {
            match self.resolve(&san, mover) {
                Some((from, to)) => {
                    log::info!("{notation} resolved for {} as {from}{to}", mover.name());
                    return Ok(MoveSquares {
                        from,
                        to,
                        san: notation,
                        mover,
                    });
                }
                None => log::debug!("{notation} is not legal with {} to move", mover.name()),
            }
        }

        log::warn!("invalid move: {notation}");
        Err(invalid())
    }

    fn resolve(&self, san: &San, mover: PieceColor) -> Option<(BoardSquare, BoardSquare)> {
        let m = match self.position.to_engine(mover) {
            Ok(pos) => san.to_move(&pos).ok()?,
            Err(err) => {
                log::debug!(
                    "position rejected with {} to move ({err}), matching pseudo-legal moves",
                    mover.name()
                );
                self.match_pseudo_legal(san, mover)?
            }
        };
        let (from, to) = click_squares_of(&m)?;
        Some((from_engine_square(from)?, from_engine_square(to)?))
    }

    /// Single pseudo-legal move matching `san`; ambiguous notation fails.
    fn match_pseudo_legal(&self, san: &San, mover: PieceColor) -> Option<Move> {
        let mut candidates = self
            .position
            .pseudo_legal_moves(mover)
            .into_iter()
            .filter(|m| san.matches(m));
        let m = candidates.next()?;
        candidates.next().is_none().then_some(m)
    }
}

fn opposite(color: PieceColor) -> PieceColor {
    match color {
        PieceColor::White => PieceColor::Black,
        PieceColor::Black => PieceColor::White,
    }
}

/// From and to squares a user would click. Castling is clicked as a king
/// move to the g- or c-file rather than onto the rook.
fn click_squares_of(m: &Move) -> Option<(Square, Square)> {
    let from = m.from()?;
    let to = match *m {
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() {
                File::G
            } else {
                File::C
            };
            Square::from_coords(file, king.rank())
        }
        _ => m.to(),
    };
    Some((from, to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::tests::starting_pieces;
    use chess_grid_core::{Piece, SquareIndex};
    use chess_grid_detect::SquareClassification;

    fn classification_of(pieces: &[(BoardSquare, Piece)], orientation: Orientation) -> BoardClassification {
        let mut out = BoardClassification::default();
        for &(square, piece) in pieces {
            out.set(orientation.to_index(square), SquareClassification::Piece(piece));
        }
        out
    }

    fn start_tracker() -> BoardStateTracker {
        let mut tracker = BoardStateTracker::new();
        tracker.rebuild(
            &classification_of(&starting_pieces(), Orientation::Normal),
            Orientation::Normal,
        );
        tracker
    }

    fn sq(text: &str) -> BoardSquare {
        text.parse().expect("square")
    }

    #[test]
    fn knight_development_resolves_to_b1_c3() {
        let m = start_tracker()
            .apply_move(&["n", "c", "3"], PieceColor::White)
            .expect("legal");
        assert_eq!((m.from, m.to), (sq("b1"), sq("c3")));
        assert_eq!(m.to_string(), "b1c3");
        assert_eq!(m.mover, PieceColor::White);
    }

    #[test]
    fn wrong_turn_hint_is_recovered_by_retry() {
        let m = start_tracker()
            .apply_move(&["e", "5"], PieceColor::White)
            .expect("legal for black");
        assert_eq!((m.from, m.to), (sq("e7"), sq("e5")));
        assert_eq!(m.mover, PieceColor::Black);
    }

    #[test]
    fn black_hint_resolves_black_move_first() {
        let m = start_tracker()
            .apply_move(&["n", "f", "6"], PieceColor::Black)
            .expect("legal");
        assert_eq!((m.from, m.to), (sq("g8"), sq("f6")));
    }

    #[test]
    fn garbage_is_invalid_notation() {
        let err = start_tracker()
            .apply_move(&["z", "9"], PieceColor::White)
            .expect_err("invalid");
        assert_eq!(
            err,
            TrackerError::InvalidMoveNotation {
                notation: "z9".to_string()
            }
        );
        assert!(start_tracker()
            .apply_move(&["e", "6", "e", "5"], PieceColor::White)
            .is_err());
    }

    #[test]
    fn castling_clicks_king_squares() {
        let pieces: Vec<(BoardSquare, Piece)> = [("e1", 'K'), ("h1", 'R'), ("a1", 'R'), ("e8", 'k')]
            .iter()
            .filter_map(|&(s, c)| Some((s.parse().ok()?, Piece::from_symbol(c)?)))
            .collect();
        let mut tracker = BoardStateTracker::new();
        tracker.rebuild(&classification_of(&pieces, Orientation::Normal), Orientation::Normal);

        let short = tracker.apply_move(&["o", "o"], PieceColor::White).expect("O-O");
        assert_eq!((short.from, short.to), (sq("e1"), sq("g1")));
        let long = tracker.apply_move(&["o", "o", "o"], PieceColor::White).expect("O-O-O");
        assert_eq!((long.from, long.to), (sq("e1"), sq("c1")));
    }

    #[test]
    fn flipped_rebuild_matches_normal() {
        let pieces = starting_pieces();
        let mut normal = BoardStateTracker::new();
        normal.rebuild(&classification_of(&pieces, Orientation::Normal), Orientation::Normal);
        let mut flipped = BoardStateTracker::new();
        flipped.rebuild(&classification_of(&pieces, Orientation::Flipped), Orientation::Flipped);
        assert_eq!(normal.position().fen(), flipped.position().fen());

        // the top-left rendered square of a flipped board is h1
        let top_left = SquareIndex::new(0, 0).expect("idx");
        assert_eq!(Orientation::Flipped.to_square(top_left), sq("h1"));
    }

    fn start_tracker_missing(square: &str) -> BoardStateTracker {
        let mut c = classification_of(&starting_pieces(), Orientation::Normal);
        c.set(
            Orientation::Normal.to_index(sq(square)),
            SquareClassification::Unclassified,
        );
        let mut tracker = BoardStateTracker::new();
        tracker.rebuild(&c, Orientation::Normal);
        tracker
    }

    #[test]
    fn moves_resolve_when_a_king_is_not_recognised() {
        let m = start_tracker_missing("e8")
            .apply_move(&["n", "c", "3"], PieceColor::White)
            .expect("knight move");
        assert_eq!((m.from, m.to), (sq("b1"), sq("c3")));

        let tracker = start_tracker_missing("e1");
        let m = tracker
            .apply_move(&["e", "4"], PieceColor::White)
            .expect("double push");
        assert_eq!((m.from, m.to), (sq("e2"), sq("e4")));

        let m = tracker
            .apply_move(&["e", "5"], PieceColor::White)
            .expect("black reply");
        assert_eq!((m.from, m.to), (sq("e7"), sq("e5")));
        assert_eq!(m.mover, PieceColor::Black);

        assert!(tracker.apply_move(&["n", "d", "4"], PieceColor::White).is_err());
    }

    #[test]
    fn pawn_misread_on_back_rank_does_not_block_moves() {
        let mut pieces = starting_pieces();
        pieces.push((sq("d8"), Piece::from_symbol('P').expect("pawn")));
        pieces.retain(|&(s, p)| s != sq("d8") || p.color == PieceColor::White);
        let mut tracker = BoardStateTracker::new();
        tracker.rebuild(&classification_of(&pieces, Orientation::Normal), Orientation::Normal);

        let m = tracker
            .apply_move(&["n", "f", "3"], PieceColor::White)
            .expect("knight move");
        assert_eq!((m.from, m.to), (sq("g1"), sq("f3")));
    }

    #[test]
    fn unclassified_squares_stay_empty() {
        let mut c = BoardClassification::default();
        let idx = Orientation::Normal.to_index(sq("d4"));
        c.set(idx, SquareClassification::Unclassified);
        let mut tracker = BoardStateTracker::new();
        let pos = tracker.rebuild(&c, Orientation::Normal);
        assert_eq!(pos.piece_count(), 0);
    }
}
