/// Borrowed single-channel image, row-major.
#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

/// Owned single-channel image, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ImageError {
    #[error("invalid image buffer length (expected {expected} bytes, got {got})")]
    InvalidBuffer { expected: usize, got: usize },
    #[error("invalid image dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },
}

impl<'a> GrayImageView<'a> {
    /// Wrap a raw buffer, checking that `data.len() == width * height`.
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Result<Self, ImageError> {
        let expected = width
            .checked_mul(height)
            .ok_or(ImageError::InvalidDimensions { width, height })?;
        if data.len() != expected {
            return Err(ImageError::InvalidBuffer {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Copy the `w × h` window at `(x, y)` into an owned image.
    ///
    /// Returns `None` if the window does not fit inside the view.
    pub fn crop(&self, x: usize, y: usize, w: usize, h: usize) -> Option<GrayImage> {
        if x.checked_add(w)? > self.width || y.checked_add(h)? > self.height {
            return None;
        }
        let mut data = Vec::with_capacity(w * h);
        for row in y..y + h {
            let start = row * self.width + x;
            data.extend_from_slice(&self.data[start..start + w]);
        }
        Some(GrayImage {
            width: w,
            height: h,
            data,
        })
    }
}

impl GrayImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    #[inline]
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.width + x] = value;
    }
}

/// Channel order of a packed color buffer.
///
/// Screen grabbers disagree on this; BGRA is what most native capture APIs
/// hand back, RGBA is what `image` uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    Gray,
    Rgb,
    Bgr,
    Rgba,
    Bgra,
}

impl PixelLayout {
    #[inline]
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Gray => 1,
            PixelLayout::Rgb | PixelLayout::Bgr => 3,
            PixelLayout::Rgba | PixelLayout::Bgra => 4,
        }
    }

    /// Byte offsets of the red, green and blue channels within one pixel.
    #[inline]
    fn rgb_offsets(self) -> [usize; 3] {
        match self {
            PixelLayout::Gray => [0, 0, 0],
            PixelLayout::Rgb | PixelLayout::Rgba => [0, 1, 2],
            PixelLayout::Bgr | PixelLayout::Bgra => [2, 1, 0],
        }
    }
}

/// Borrowed packed color image, as delivered by a screen capture.
#[derive(Clone, Copy, Debug)]
pub struct ColorImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub layout: PixelLayout,
    pub data: &'a [u8],
}

impl<'a> ColorImageView<'a> {
    pub fn new(
        width: usize,
        height: usize,
        layout: PixelLayout,
        data: &'a [u8],
    ) -> Result<Self, ImageError> {
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(layout.channels()))
            .ok_or(ImageError::InvalidDimensions { width, height })?;
        if data.len() != expected {
            return Err(ImageError::InvalidBuffer {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            layout,
            data,
        })
    }
}

/// Luma conversion with the ITU-R BT.601 weights (`0.299 R + 0.587 G + 0.114 B`).
///
/// Matches cv2 `COLOR_BGR2GRAY` (same weights and fixed-point rounding),
/// which the tuned intensity cutoffs assume, and reads BGR captures
/// directly. A pure gray pixel maps to itself.
pub fn to_grayscale(src: &ColorImageView<'_>) -> GrayImage {
    let channels = src.layout.channels();
    if src.layout == PixelLayout::Gray {
        return GrayImage {
            width: src.width,
            height: src.height,
            data: src.data[..src.width * src.height].to_vec(),
        };
    }

    let [ro, go, bo] = src.layout.rgb_offsets();
    let data = src
        .data
        .chunks_exact(channels)
        .map(|px| {
            let r = px[ro] as u32;
            let g = px[go] as u32;
            let b = px[bo] as u32;
            // 14-bit fixed point: 4899 + 9617 + 1868 = 16384
            ((r * 4899 + g * 9617 + b * 1868 + (1 << 13)) >> 14) as u8
        })
        .collect();

    GrayImage {
        width: src.width,
        height: src.height,
        data,
    }
}
