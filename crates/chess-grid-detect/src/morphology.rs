//! Rectangular-kernel morphology on binary masks.

use chess_grid_core::{GrayImage, GrayImageView};
use serde::{Deserialize, Serialize};

/// Rectangular structuring element, anchored at `(width / 2, height / 2)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectKernel {
    pub width: usize,
    pub height: usize,
}

impl Default for RectKernel {
    /// Tall narrow kernel: bridges the thin grid lines between squares
    /// without merging whole pieces into the frame around the board.
    fn default() -> Self {
        Self {
            width: 4,
            height: 8,
        }
    }
}

/// Max filter over the reflected kernel. Pixels outside the image never
/// contribute.
pub fn dilate(src: &GrayImageView<'_>, kernel: RectKernel) -> GrayImage {
    let (kw, kh) = kernel.extent();
    let (ax, ay) = (kw / 2, kh / 2);
    separable_filter(src, (kw - 1 - ax, ax), (kh - 1 - ay, ay), 0, u8::max)
}

/// Min filter. Pixels outside the image never contribute.
pub fn erode(src: &GrayImageView<'_>, kernel: RectKernel) -> GrayImage {
    let (kw, kh) = kernel.extent();
    let (ax, ay) = (kw / 2, kh / 2);
    separable_filter(src, (ax, kw - 1 - ax), (ay, kh - 1 - ay), u8::MAX, u8::min)
}

/// Dilation followed by erosion: fills gaps smaller than the kernel.
///
/// Dilation uses the reflected element, so even-sized kernels do not shift
/// shapes that are already closed.
pub fn close(src: &GrayImageView<'_>, kernel: RectKernel) -> GrayImage {
    let dilated = dilate(src, kernel);
    erode(&dilated.view(), kernel)
}

impl RectKernel {
    #[inline]
    fn extent(self) -> (usize, usize) {
        (self.width.max(1), self.height.max(1))
    }
}

/// Window spans `x - left ..= x + right` and `y - up ..= y + down`.
fn separable_filter(
    src: &GrayImageView<'_>,
    (left, right): (usize, usize),
    (up, down): (usize, usize),
    identity: u8,
    pick: fn(u8, u8) -> u8,
) -> GrayImage {
    let (w, h) = (src.width, src.height);

    let mut rows = GrayImage::new(w, h);
    for y in 0..h {
        let line = &src.data[y * w..(y + 1) * w];
        for x in 0..w {
            let lo = x.saturating_sub(left);
            let hi = (x + right + 1).min(w);
            rows.data[y * w + x] = line[lo..hi].iter().fold(identity, |a, &v| pick(a, v));
        }
    }

    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        let lo = y.saturating_sub(up);
        let hi = (y + down + 1).min(h);
        for x in 0..w {
            let mut acc = identity;
            for yy in lo..hi {
                acc = pick(acc, rows.data[yy * w + x]);
            }
            out.data[y * w + x] = acc;
        }
    }
    out
}
