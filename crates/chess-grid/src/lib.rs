//! High-level facade crate for the `chess-grid-*` workspace.
//!
//! This crate provides:
//! - re-exports of the core, detection and tracking crates
//! - the [`ScreenCapture`] and [`PointerControl`] traits the host implements
//! - [`ChessGridSession`], which locates the board, learns the piece set
//!   from the starting position, keeps the position up to date and turns
//!   spoken moves into clicks
//! - JSON config and report helpers
//!
//! ## Quickstart
//!
//! ```no_run
//! use chess_grid::{ChessGridSession, ClickRecorder, Orientation, PieceColor, StillImageScreen};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let screen = StillImageScreen::open("start.png")?;
//! let mut session = ChessGridSession::with_defaults(screen, ClickRecorder::new());
//!
//! let position = session.build_reference(Orientation::Normal)?;
//! println!("{}", position.render(Orientation::Normal));
//!
//! let m = session.apply_move(&["n", "f", "3"], PieceColor::White)?;
//! println!("{m}: {:?}", session.pointer().clicks());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `chess_grid::core`: image buffers, thresholding, square sampling, geometry.
//! - `chess_grid::detect`: board locator and piece classifier.
//! - `chess_grid::tracker`: position tracking and move resolution.

pub use chess_grid_core as core;
pub use chess_grid_detect as detect;
pub use chess_grid_tracker as tracker;

pub use chess_grid_core::{BoardRegion, BoardSquare, Orientation, PieceColor, ScreenRect};
pub use chess_grid_detect::{ClassificationThresholds, LocatorParams};
pub use chess_grid_tracker::{BoardPosition, MoveSquares};

mod capture;
mod config;
mod session;

pub use capture::{CaptureError, ClickRecorder, PointerControl, ScreenCapture, StillImageScreen};
pub use config::{ChessGridConfig, ConfigError, DetectionReport, MoveReport};
pub use session::{ChessGridSession, SessionError, SessionPhase};
