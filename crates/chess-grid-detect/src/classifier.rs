//! Reference-then-match piece recognition.
//!
//! A reference pass samples a board known to be in the starting position
//! and stores one mask tile per piece symbol. Later passes decide occupancy
//! and color from mask coverage, then compare the square's mask tile with
//! the stored signatures of that color in [`MATCH_PRIORITY`] order; the first
//! signature within the distance cutoff wins.

use chess_grid_core::{
    coverage, BoardSquare, GrayImage, GrayImageView, IntensityCutoffs, Orientation, Piece,
    PieceColor, PieceKind, SampleError, SquareIndex, SquareSampler, ThresholdedImage,
    BOARD_SQUARES, MATCH_PRIORITY,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Cutoffs for occupancy and signature matching.
///
/// Real displays differ in gamma and contrast, so every value is tunable.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationThresholds {
    /// Pixels at or above this intensity are light.
    pub light_cutoff: u8,
    /// Pixels at or below this intensity are dark.
    pub dark_cutoff: u8,
    /// A square holds a light piece only if more than this fraction is light.
    pub min_light_coverage: f32,
    /// A square holds a dark piece only if more than this fraction is dark.
    pub min_dark_coverage: f32,
    /// Light tiles match a signature below this mean squared distance.
    pub light_match_distance: f64,
    /// Dark tiles match a signature below this mean squared distance.
    pub dark_match_distance: f64,
}

impl Default for ClassificationThresholds {
    fn default() -> Self {
        Self {
            light_cutoff: 150,
            dark_cutoff: 80,
            min_light_coverage: 0.08,
            min_dark_coverage: 0.2,
            light_match_distance: 2000.0,
            dark_match_distance: 3000.0,
        }
    }
}

impl ClassificationThresholds {
    pub fn intensity(&self) -> IntensityCutoffs {
        IntensityCutoffs {
            light: self.light_cutoff,
            dark: self.dark_cutoff,
        }
    }
}

/// Per-square result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SquareClassification {
    /// Neither coverage test passed.
    #[default]
    Empty,
    Piece(Piece),
    /// A coverage test passed but no signature was close enough.
    /// Treated like [`SquareClassification::Empty`] when building a position.
    Unclassified,
}

impl SquareClassification {
    #[inline]
    pub fn piece(self) -> Option<Piece> {
        match self {
            SquareClassification::Piece(p) => Some(p),
            _ => None,
        }
    }
}

/// Classification of all 64 rendered squares, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardClassification {
    squares: [SquareClassification; BOARD_SQUARES * BOARD_SQUARES],
}

impl Default for BoardClassification {
    fn default() -> Self {
        Self {
            squares: [SquareClassification::Empty; BOARD_SQUARES * BOARD_SQUARES],
        }
    }
}

impl BoardClassification {
    #[inline]
    pub fn get(&self, index: SquareIndex) -> SquareClassification {
        self.squares[index.linear()]
    }

    #[inline]
    pub fn set(&mut self, index: SquareIndex, value: SquareClassification) {
        self.squares[index.linear()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (SquareIndex, SquareClassification)> + '_ {
        SquareIndex::all().map(move |idx| (idx, self.squares[idx.linear()]))
    }

    /// Pieces keyed by algebraic square under `orientation`.
    pub fn pieces(&self, orientation: Orientation) -> Vec<(BoardSquare, Piece)> {
        self.iter()
            .filter_map(|(idx, c)| c.piece().map(|p| (orientation.to_square(idx), p)))
            .collect()
    }

    pub fn unclassified_count(&self) -> usize {
        self.squares
            .iter()
            .filter(|c| matches!(c, SquareClassification::Unclassified))
            .count()
    }
}

/// Reference tiles, one per piece symbol that was visible when referencing.
#[derive(Clone, Debug, Default)]
pub struct PieceSignatures {
    tiles: HashMap<Piece, GrayImage>,
}

impl PieceSignatures {
    pub fn insert(&mut self, piece: Piece, tile: GrayImage) {
        self.tiles.insert(piece, tile);
    }

    pub fn get(&self, piece: Piece) -> Option<&GrayImage> {
        self.tiles.get(&piece)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Starting-position square whose expected piece failed its coverage test.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReferenceFailure {
    pub square: BoardSquare,
    pub expected: Piece,
    pub coverage: f32,
}

impl fmt::Display for ReferenceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {} (coverage {:.3})",
            self.expected, self.square, self.coverage
        )
    }
}

/// Squares sampled while referencing, as `(file, rank, symbol)`.
///
/// One square per piece symbol, all on the queen side of the start position.
const REFERENCE_LAYOUT: [(u8, u8, char); 12] = [
    (0, 7, 'r'),
    (1, 7, 'n'),
    (2, 7, 'b'),
    (3, 7, 'q'),
    (4, 7, 'k'),
    (0, 6, 'p'),
    (0, 1, 'P'),
    (0, 0, 'R'),
    (1, 0, 'N'),
    (2, 0, 'B'),
    (3, 0, 'Q'),
    (4, 0, 'K'),
];

/// Reference squares with their expected pieces.
pub fn reference_layout() -> impl Iterator<Item = (BoardSquare, Piece)> {
    REFERENCE_LAYOUT
        .iter()
        .filter_map(|&(file, rank, symbol)| {
            Some((BoardSquare::new(file, rank)?, Piece::from_symbol(symbol)?))
        })
}

/// Sum of squared per-pixel differences divided by the pixel count.
///
/// `None` when the tiles differ in size or are empty.
pub fn mean_squared_distance(a: &GrayImageView<'_>, b: &GrayImageView<'_>) -> Option<f64> {
    if a.width != b.width || a.height != b.height || a.pixel_count() == 0 {
        return None;
    }
    let sum: f64 = a
        .data
        .iter()
        .zip(b.data)
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum();
    Some(sum / a.pixel_count() as f64)
}

/// Holds the thresholds and the current signature set.
#[derive(Clone, Debug, Default)]
pub struct PieceClassifier {
    thresholds: ClassificationThresholds,
    signatures: PieceSignatures,
}

impl PieceClassifier {
    pub fn new(thresholds: ClassificationThresholds) -> Self {
        Self {
            thresholds,
            signatures: PieceSignatures::default(),
        }
    }

    pub fn with_signatures(thresholds: ClassificationThresholds, signatures: PieceSignatures) -> Self {
        Self {
            thresholds,
            signatures,
        }
    }

    #[inline]
    pub fn thresholds(&self) -> &ClassificationThresholds {
        &self.thresholds
    }

    #[inline]
    pub fn signatures(&self) -> &PieceSignatures {
        &self.signatures
    }

    /// Replace the signature set from a board showing the starting position.
    ///
    /// Every reference square whose expected piece fails its coverage test is
    /// reported; the signatures that did pass are kept.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, masks, sampler), fields(square_size = sampler.square_size()))
    )]
    pub fn build_reference(
        &mut self,
        masks: &ThresholdedImage,
        sampler: &SquareSampler,
        orientation: Orientation,
    ) -> Result<Vec<ReferenceFailure>, SampleError> {
        let mut signatures = PieceSignatures::default();
        let mut failures = Vec::new();

        for (square, piece) in reference_layout() {
            let index = orientation.to_index(square);
            let (mask, min_coverage) = match piece.color {
                PieceColor::Black => (&masks.dark, self.thresholds.min_dark_coverage),
                PieceColor::White => (&masks.light, self.thresholds.min_light_coverage),
            };
            let tile = sampler.sample(&mask.view(), index)?;
            let cov = coverage(&tile.view());
            if cov > min_coverage {
                signatures.insert(piece, tile);
            } else {
                log::warn!("issue detecting the {piece} at {square} (coverage {cov:.3})");
                failures.push(ReferenceFailure {
                    square,
                    expected: piece,
                    coverage: cov,
                });
            }
        }

        log::debug!(
            "reference built: {} signatures, {} failures",
            signatures.len(),
            failures.len()
        );
        self.signatures = signatures;
        Ok(failures)
    }

    /// Classify one square from its light and dark mask tiles.
    ///
    /// Dark pieces are tried first; a dark-covered square with no matching
    /// dark signature still gets the light test.
    pub fn classify_square(
        &self,
        light: &GrayImageView<'_>,
        dark: &GrayImageView<'_>,
    ) -> SquareClassification {
        let t = &self.thresholds;
        let mut covered = false;

        if coverage(dark) > t.min_dark_coverage {
            covered = true;
            if let Some(piece) = self.match_signature(dark, PieceColor::Black, t.dark_match_distance)
            {
                return SquareClassification::Piece(piece);
            }
        }

        if coverage(light) > t.min_light_coverage {
            covered = true;
            if let Some(piece) =
                self.match_signature(light, PieceColor::White, t.light_match_distance)
            {
                return SquareClassification::Piece(piece);
            }
        }

        if covered {
            SquareClassification::Unclassified
        } else {
            SquareClassification::Empty
        }
    }

    fn match_signature(
        &self,
        tile: &GrayImageView<'_>,
        color: PieceColor,
        max_distance: f64,
    ) -> Option<Piece> {
        MATCH_PRIORITY
            .iter()
            .map(|&kind: &PieceKind| Piece::new(color, kind))
            .find(|&piece| {
                self.signatures
                    .get(piece)
                    .and_then(|sig| mean_squared_distance(&sig.view(), tile))
                    .is_some_and(|d| d < max_distance)
            })
    }

    /// Classify all 64 squares of a thresholded board capture.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, masks, sampler), fields(square_size = sampler.square_size()))
    )]
    pub fn classify_board(
        &self,
        masks: &ThresholdedImage,
        sampler: &SquareSampler,
    ) -> Result<BoardClassification, SampleError> {
        let light = sampler.sample_all(&masks.light.view())?;
        let dark = sampler.sample_all(&masks.dark.view())?;

        let mut out = BoardClassification::default();
        for index in SquareIndex::all() {
            let i = index.linear();
            let result = self.classify_square(&light[i].view(), &dark[i].view());
            if result == SquareClassification::Unclassified {
                log::debug!(
                    "square row {} col {} is covered but matches no signature",
                    index.row(),
                    index.col()
                );
            }
            out.set(index, result);
        }
        Ok(out)
    }
}
