//! Host collaborators: screen capture and pointer control.
//!
//! The session only talks to the host through these two traits. The
//! in-memory implementations here back the CLI (a screenshot stands in for
//! the screen) and the tests.

use chess_grid_core::ScreenRect;
use image::RgbaImage;
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error("no active window")]
    NoActiveWindow,
    #[error("region {rect:?} is outside the {width}x{height} screen")]
    OutOfBounds {
        rect: ScreenRect,
        width: u32,
        height: u32,
    },
    #[error("pointer control failed: {0}")]
    Pointer(String),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Read access to the screen.
pub trait ScreenCapture {
    /// Bounds of the foreground window in absolute screen pixels.
    fn active_window_bounds(&mut self) -> Result<ScreenRect, CaptureError>;

    /// Pixels of `rect`, `rect.width × rect.height` in size.
    fn capture_region(&mut self, rect: ScreenRect) -> Result<RgbaImage, CaptureError>;
}

/// Mouse automation.
pub trait PointerControl {
    /// Move to `(x, y)` and press-hold-release the primary button.
    fn move_cursor_and_click(&mut self, x: i32, y: i32) -> Result<(), CaptureError>;
}

/// A still image used as the whole screen.
#[derive(Clone, Debug)]
pub struct StillImageScreen {
    image: RgbaImage,
    window: Option<ScreenRect>,
}

impl StillImageScreen {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image,
            window: None,
        }
    }

    /// Decode a screenshot from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        Ok(Self::new(image::open(path)?.to_rgba8()))
    }

    /// Report `window` as the foreground window instead of the whole image.
    pub fn with_window(mut self, window: ScreenRect) -> Self {
        self.window = Some(window);
        self
    }

    /// Swap the screen contents, e.g. after a move was played.
    pub fn set_image(&mut self, image: RgbaImage) {
        self.image = image;
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

impl ScreenCapture for StillImageScreen {
    fn active_window_bounds(&mut self) -> Result<ScreenRect, CaptureError> {
        let (width, height) = self.image.dimensions();
        if width == 0 || height == 0 {
            return Err(CaptureError::NoActiveWindow);
        }
        Ok(self
            .window
            .unwrap_or_else(|| ScreenRect::new(0, 0, width, height)))
    }

    fn capture_region(&mut self, rect: ScreenRect) -> Result<RgbaImage, CaptureError> {
        let (width, height) = self.image.dimensions();
        let fits = rect.x >= 0
            && rect.y >= 0
            && (rect.x as u64 + rect.width as u64) <= width as u64
            && (rect.y as u64 + rect.height as u64) <= height as u64;
        if !fits {
            return Err(CaptureError::OutOfBounds {
                rect,
                width,
                height,
            });
        }
        Ok(image::imageops::crop_imm(
            &self.image,
            rect.x as u32,
            rect.y as u32,
            rect.width,
            rect.height,
        )
        .to_image())
    }
}

/// Pointer that records clicks instead of performing them.
#[derive(Clone, Debug, Default)]
pub struct ClickRecorder {
    clicks: Vec<(i32, i32)>,
}

impl ClickRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clicks(&self) -> &[(i32, i32)] {
        &self.clicks
    }

    /// Return and forget the recorded clicks.
    pub fn take(&mut self) -> Vec<(i32, i32)> {
        std::mem::take(&mut self.clicks)
    }
}

impl PointerControl for ClickRecorder {
    fn move_cursor_and_click(&mut self, x: i32, y: i32) -> Result<(), CaptureError> {
        self.clicks.push((x, y));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn crops_inside_and_rejects_outside() {
        let mut img = RgbaImage::from_pixel(20, 10, Rgba([0, 0, 0, 255]));
        img.put_pixel(5, 3, Rgba([255, 255, 255, 255]));
        let mut screen = StillImageScreen::new(img);

        let crop = screen
            .capture_region(ScreenRect::new(5, 3, 4, 4))
            .expect("inside");
        assert_eq!(crop.dimensions(), (4, 4));
        assert_eq!(crop.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));

        assert!(matches!(
            screen.capture_region(ScreenRect::new(18, 0, 4, 4)),
            Err(CaptureError::OutOfBounds { .. })
        ));
        assert!(screen.capture_region(ScreenRect::new(-1, 0, 4, 4)).is_err());
    }

    #[test]
    fn window_defaults_to_whole_image() {
        let img = RgbaImage::new(30, 20);
        let mut screen = StillImageScreen::new(img.clone());
        assert_eq!(
            screen.active_window_bounds().expect("window"),
            ScreenRect::new(0, 0, 30, 20)
        );
        let mut windowed = StillImageScreen::new(img).with_window(ScreenRect::new(2, 3, 10, 10));
        assert_eq!(
            windowed.active_window_bounds().expect("window"),
            ScreenRect::new(2, 3, 10, 10)
        );
    }
}
