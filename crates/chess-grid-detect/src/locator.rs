//! Finding the board inside a captured window.
//!
//! Algorithm:
//! 1. Threshold the grayscale window at each configured cutoff (a high one
//!    for light themes, a lower one for dark themes).
//! 2. Close each mask with a small rectangular kernel so thin grid lines do
//!    not split the board.
//! 3. Walk the outer and hole contours of every closed mask, in mask order.
//! 4. Accept the first bounding box whose sides fall inside the board size
//!    range and differ by less than the squareness tolerance.
//! 5. Return the largest square centered in that box, in screen coordinates.
//!
//! There is no global ranking: the first acceptable contour wins.

use crate::contours::{BoundingBox, ContourScanner};
use crate::morphology::{close, RectKernel};
use chess_grid_core::{light_mask, BoardRegion, GrayImageView, ScreenRect};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Tunables for [`BoardLocator`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorParams {
    /// Light-pixel cutoffs, tried in order.
    pub mask_cutoffs: Vec<u8>,
    /// Structuring element for the closing step.
    pub close_kernel: RectKernel,
    /// Smallest accepted board side in pixels (inclusive).
    pub min_side: u32,
    /// Largest accepted board side in pixels (exclusive).
    pub max_side: u32,
    /// Accepted boxes must satisfy `|width - height| < max_side_difference`.
    pub max_side_difference: u32,
}

impl Default for LocatorParams {
    fn default() -> Self {
        Self {
            mask_cutoffs: vec![215, 115],
            close_kernel: RectKernel::default(),
            min_side: 270,
            max_side: 1500,
            max_side_difference: 60,
        }
    }
}

/// Size and squareness test for one contour box.
pub fn is_board_candidate(bbox: &BoundingBox, params: &LocatorParams) -> bool {
    let in_range = |v: u32| v >= params.min_side && v < params.max_side;
    in_range(bbox.width)
        && in_range(bbox.height)
        && bbox.width.abs_diff(bbox.height) < params.max_side_difference
}

/// First box in `boxes` that passes [`is_board_candidate`].
pub fn first_board_candidate<I>(boxes: I, params: &LocatorParams) -> Option<BoundingBox>
where
    I: IntoIterator<Item = BoundingBox>,
{
    boxes
        .into_iter()
        .find(|bbox| is_board_candidate(bbox, params))
}

/// Contour-based board finder. Holds no state between calls.
#[derive(Clone, Debug, Default)]
pub struct BoardLocator {
    params: LocatorParams,
}

impl BoardLocator {
    pub fn new(params: LocatorParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &LocatorParams {
        &self.params
    }

    /// Contour boxes of every closed mask, lazily, in mask order.
    pub fn candidate_boxes<'a>(
        &'a self,
        gray: &'a GrayImageView<'a>,
    ) -> impl Iterator<Item = BoundingBox> + 'a {
        self.params.mask_cutoffs.iter().flat_map(move |&cutoff| {
            let mask = light_mask(gray, cutoff);
            let closed = close(&mask.view(), self.params.close_kernel);
            ContourScanner::new(closed).map(|contour| contour.bbox)
        })
    }

    /// Locate the board in a grayscale capture of `window`.
    ///
    /// `gray` must be the capture of exactly `window`; the returned region is
    /// offset by the window origin.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, gray), fields(width = gray.width, height = gray.height))
    )]
    pub fn locate(&self, window: ScreenRect, gray: &GrayImageView<'_>) -> Option<BoardRegion> {
        let Some(bbox) = first_board_candidate(self.candidate_boxes(gray), &self.params) else {
            log::info!(
                "no board-sized contour in {}x{} window at ({}, {})",
                gray.width,
                gray.height,
                window.x,
                window.y
            );
            return None;
        };

        let region = BoardRegion::centered_in(
            window.x + bbox.x as i32,
            window.y + bbox.y as i32,
            bbox.width,
            bbox.height,
        )?;
        log::info!(
            "board found: contour {}x{} at ({}, {}), region side {} at {:?}",
            bbox.width,
            bbox.height,
            bbox.x,
            bbox.y,
            region.side(),
            region.origin()
        );
        Some(region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_grid_core::GrayImage;

    fn bbox(width: u32, height: u32) -> BoundingBox {
        BoundingBox {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    fn fill(img: &mut GrayImage, x0: usize, y0: usize, w: usize, h: usize, v: u8) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                img.set(x, y, v);
            }
        }
    }

    #[test]
    fn candidate_predicate_bounds() {
        let p = LocatorParams::default();
        assert!(is_board_candidate(&bbox(270, 270), &p));
        assert!(is_board_candidate(&bbox(1499, 1440), &p));
        assert!(!is_board_candidate(&bbox(269, 300), &p));
        assert!(!is_board_candidate(&bbox(1500, 1480), &p));
        assert!(!is_board_candidate(&bbox(400, 340), &p));
        assert!(is_board_candidate(&bbox(400, 341), &p));
    }

    #[test]
    fn first_match_wins_over_better_later_box() {
        let p = LocatorParams::default();
        let boxes = [bbox(100, 100), bbox(400, 350), bbox(400, 400)];
        assert_eq!(first_board_candidate(boxes, &p), Some(bbox(400, 350)));
        assert_eq!(first_board_candidate([bbox(10, 10)], &p), None);
    }

    #[test]
    fn locates_bright_block_with_window_offset() {
        let mut img = GrayImage::new(600, 500);
        fill(&mut img, 100, 60, 320, 300, 230);
        let locator = BoardLocator::default();
        let window = ScreenRect::new(1000, 200, 600, 500);
        let region = locator.locate(window, &img.view()).expect("board");
        assert_eq!(region.side(), 300);
        assert_eq!(region.origin(), (1000 + 100 + 10, 200 + 60));
    }

    #[test]
    fn dark_theme_board_found_by_second_cutoff() {
        let mut img = GrayImage::new(500, 500);
        fill(&mut img, 50, 50, 320, 320, 140);
        let region = BoardLocator::default()
            .locate(ScreenRect::new(0, 0, 500, 500), &img.view())
            .expect("board");
        assert_eq!(region.origin(), (50, 50));
        assert_eq!(region.side(), 320);
    }

    #[test]
    fn dark_board_on_light_page_is_found_as_hole() {
        // wide page keeps the outer component out of the squareness range
        let mut img = GrayImage::filled(700, 400, 255);
        fill(&mut img, 40, 40, 320, 320, 30);
        let region = BoardLocator::default()
            .locate(ScreenRect::new(0, 0, 700, 400), &img.view())
            .expect("board");
        assert_eq!(region.origin(), (39, 39));
        assert_eq!(region.side(), 322);
    }

    #[test]
    fn nothing_board_sized_returns_none() {
        let mut img = GrayImage::new(600, 600);
        fill(&mut img, 10, 10, 200, 200, 255);
        fill(&mut img, 250, 250, 300, 100, 255);
        let found = BoardLocator::default().locate(ScreenRect::new(0, 0, 600, 600), &img.view());
        assert!(found.is_none());
    }

    #[test]
    fn params_deserialize_with_defaults() {
        let p: LocatorParams = serde_json::from_str(r#"{"min_side": 100}"#).expect("json");
        assert_eq!(p.min_side, 100);
        assert_eq!(p.mask_cutoffs, vec![215, 115]);
    }
}
