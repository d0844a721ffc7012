//! Partitioning of a board-aligned image into its 64 squares.

use crate::{GrayImage, GrayImageView, SquareIndex, BOARD_SQUARES};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SampleError {
    #[error("square size must be positive")]
    ZeroSquareSize,
    #[error("image {width}x{height} is smaller than 8 squares of {square_size} px")]
    ImageTooSmall {
        width: usize,
        height: usize,
        square_size: usize,
    },
}

/// Splits a board image into `square_size × square_size` tiles.
///
/// The same sampler is used for reference building and for every detection,
/// so tiles from both passes line up pixel for pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SquareSampler {
    square_size: usize,
}

impl SquareSampler {
    pub fn new(square_size: usize) -> Result<Self, SampleError> {
        if square_size == 0 {
            return Err(SampleError::ZeroSquareSize);
        }
        Ok(Self { square_size })
    }

    /// Sampler for a board of the given side (`side / 8`, floor-divided).
    pub fn for_board_side(side: u32) -> Result<Self, SampleError> {
        Self::new(side as usize / BOARD_SQUARES)
    }

    #[inline]
    pub fn square_size(&self) -> usize {
        self.square_size
    }

    fn check(&self, image: &GrayImageView<'_>) -> Result<(), SampleError> {
        let needed = self.square_size * BOARD_SQUARES;
        if image.width < needed || image.height < needed {
            return Err(SampleError::ImageTooSmall {
                width: image.width,
                height: image.height,
                square_size: self.square_size,
            });
        }
        Ok(())
    }

    /// Tile for one square.
    pub fn sample(
        &self,
        image: &GrayImageView<'_>,
        index: SquareIndex,
    ) -> Result<GrayImage, SampleError> {
        self.check(image)?;
        Ok(self.crop_unchecked(image, index))
    }

    /// All 64 tiles in row-major order.
    pub fn sample_all(&self, image: &GrayImageView<'_>) -> Result<Vec<GrayImage>, SampleError> {
        self.check(image)?;
        Ok(SquareIndex::all()
            .map(|index| self.crop_unchecked(image, index))
            .collect())
    }

    fn crop_unchecked(&self, image: &GrayImageView<'_>, index: SquareIndex) -> GrayImage {
        let s = self.square_size;
        let mut tile = GrayImage::new(s, s);
        let x0 = index.col() * s;
        let y0 = index.row() * s;
        for y in 0..s {
            let src = (y0 + y) * image.width + x0;
            tile.data[y * s..(y + 1) * s].copy_from_slice(&image.data[src..src + s]);
        }
        tile
    }
}
