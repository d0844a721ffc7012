//! Board-state tracking on top of the `shakmaty` rules engine.
//!
//! Every detection pass rebuilds the position from scratch: the tracker
//! never applies moves itself, it only resolves spoken move tokens into the
//! from/to squares a pointer has to click.
//!
//! ```
//! use chess_grid_core::{Orientation, PieceColor};
//! use chess_grid_detect::BoardClassification;
//! use chess_grid_tracker::{normalize_notation, BoardStateTracker};
//!
//! assert_eq!(normalize_notation(&["n", "c", "3"]), "Nc3");
//!
//! let mut tracker = BoardStateTracker::new();
//! tracker.rebuild(&BoardClassification::default(), Orientation::Normal);
//! assert!(tracker.apply_move(&["e", "4"], PieceColor::White).is_err());
//! ```
//!
//! Known limitations: promotion suffixes are not parsed, and castling
//! rights are always assumed available when the placement allows them.

mod notation;
mod position;
mod tracker;

pub use notation::normalize_notation;
pub use position::{BoardPosition, EMPTY_GLYPH};
pub use tracker::{BoardStateTracker, MoveSquares, TrackerError};
