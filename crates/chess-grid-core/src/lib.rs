//! Core types and utilities for tracking an on-screen chessboard.
//!
//! This crate is intentionally small and free of I/O. It knows about
//! pixel buffers, board geometry and chess pieces, but nothing about how
//! screens are captured or how moves are validated.
//!
//! - [`ImageThresholder`] turns a capture into grayscale plus light/dark masks.
//! - [`SquareSampler`] cuts a board-aligned image into its 64 squares.
//! - [`BoardRegion`], [`SquareIndex`], [`BoardSquare`] and [`Orientation`]
//!   relate screen pixels, rendered squares and algebraic squares.

mod geometry;
mod image;
mod logger;
mod piece;
mod sampler;
mod threshold;

pub use geometry::{
    BoardRegion, BoardSquare, Orientation, ParseSquareError, ScreenRect, SquareIndex,
    BOARD_SQUARES,
};
pub use image::{to_grayscale, ColorImageView, GrayImage, GrayImageView, ImageError, PixelLayout};
pub use piece::{Piece, PieceColor, PieceKind, MATCH_PRIORITY};
pub use sampler::{SampleError, SquareSampler};
pub use threshold::{
    coverage, dark_mask, light_mask, ImageThresholder, IntensityCutoffs, ThresholdedImage,
    MASK_ON,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_from_env, init_with_level, LOG_ENV_VAR};
