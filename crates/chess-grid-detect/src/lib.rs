//! Board localisation and piece classification for on-screen chessboards.
//!
//! Two stages, both pure functions of their input images:
//! - [`BoardLocator`] finds the square board area inside a window capture
//!   from the bounding boxes of closed threshold-mask contours.
//! - [`PieceClassifier`] learns one mask signature per piece symbol from a
//!   board in the starting position, then labels every square of later
//!   captures by coverage and nearest-in-priority signature.
//!
//! Lower-level pieces ([`close`], [`ContourScanner`]) are public so the
//! locator can be tuned and inspected on real captures.

mod classifier;
mod contours;
mod locator;
mod morphology;

pub use classifier::{
    mean_squared_distance, reference_layout, BoardClassification, ClassificationThresholds,
    PieceClassifier, PieceSignatures, ReferenceFailure, SquareClassification,
};
pub use contours::{BoundingBox, Contour, ContourKind, ContourScanner};
pub use locator::{first_board_candidate, is_board_candidate, BoardLocator, LocatorParams};
pub use morphology::{close, dilate, erode, RectKernel};
