//! Contour bounding boxes of a binary mask.
//!
//! Outer contours are the 8-connected components of "on" pixels. Holes are
//! the 4-connected components of "off" pixels that do not touch the image
//! border; the hole contour runs over the "on" pixels around it, so its box
//! is the hole grown by one pixel on every side.
//!
//! [`ContourScanner`] walks the mask in raster order and yields a contour as
//! soon as the component it starts is fully traced, so callers that stop at
//! the first acceptable contour never trace the rest of the image.

use chess_grid_core::GrayImage;

/// Axis-aligned bounding box in mask pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContourKind {
    Outer,
    Hole,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contour {
    pub kind: ContourKind,
    pub bbox: BoundingBox,
}

/// Lazy raster-order contour extraction over an owned mask.
pub struct ContourScanner {
    mask: GrayImage,
    visited: Vec<bool>,
    cursor: usize,
    stack: Vec<usize>,
}

impl ContourScanner {
    pub fn new(mask: GrayImage) -> Self {
        let n = mask.width * mask.height;
        Self {
            mask,
            visited: vec![false; n],
            cursor: 0,
            stack: Vec::new(),
        }
    }

    /// Flood one component from `start`; returns its box and whether it
    /// reached the image border.
    fn trace(&mut self, start: usize, on: bool) -> (BoundingBox, bool) {
        let w = self.mask.width;
        let h = self.mask.height;
        let (mut min_x, mut min_y) = (usize::MAX, usize::MAX);
        let (mut max_x, mut max_y) = (0usize, 0usize);
        let mut touches_border = false;

        self.stack.clear();
        self.stack.push(start);
        self.visited[start] = true;

        while let Some(idx) = self.stack.pop() {
            let x = idx % w;
            let y = idx / w;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
            if x == 0 || y == 0 || x + 1 == w || y + 1 == h {
                touches_border = true;
            }

            for (dx, dy) in neighbor_offsets(on) {
                let nx = x as isize + dx;
                let ny = y as isize + dy;
                if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                    continue;
                }
                let n = ny as usize * w + nx as usize;
                if !self.visited[n] && (self.mask.data[n] != 0) == on {
                    self.visited[n] = true;
                    self.stack.push(n);
                }
            }
        }

        let bbox = BoundingBox {
            x: min_x as u32,
            y: min_y as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        };
        (bbox, touches_border)
    }
}

const N4: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const N8: [(isize, isize); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

fn neighbor_offsets(on: bool) -> &'static [(isize, isize)] {
    if on {
        &N8
    } else {
        &N4
    }
}

impl Iterator for ContourScanner {
    type Item = Contour;

    fn next(&mut self) -> Option<Contour> {
        while self.cursor < self.visited.len() {
            let idx = self.cursor;
            self.cursor += 1;
            if self.visited[idx] {
                continue;
            }

            let on = self.mask.data[idx] != 0;
            let (bbox, touches_border) = self.trace(idx, on);
            if on {
                return Some(Contour {
                    kind: ContourKind::Outer,
                    bbox,
                });
            }
            if !touches_border {
                // interior background never touches the border, so x, y >= 1
                return Some(Contour {
                    kind: ContourKind::Hole,
                    bbox: BoundingBox {
                        x: bbox.x - 1,
                        y: bbox.y - 1,
                        width: bbox.width + 2,
                        height: bbox.height + 2,
                    },
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(img: &mut GrayImage, x0: usize, y0: usize, w: usize, h: usize, v: u8) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                img.set(x, y, v);
            }
        }
    }

    #[test]
    fn finds_outer_and_hole_boxes_in_raster_order() {
        let mut img = GrayImage::new(40, 30);
        fill(&mut img, 5, 4, 20, 15, 255);
        fill(&mut img, 10, 8, 4, 3, 0);
        fill(&mut img, 30, 20, 3, 3, 255);

        let contours: Vec<Contour> = ContourScanner::new(img).collect();
        assert_eq!(contours.len(), 3);
        assert_eq!(contours[0].kind, ContourKind::Outer);
        assert_eq!(
            contours[0].bbox,
            BoundingBox {
                x: 5,
                y: 4,
                width: 20,
                height: 15
            }
        );
        assert_eq!(contours[1].kind, ContourKind::Hole);
        assert_eq!(
            contours[1].bbox,
            BoundingBox {
                x: 9,
                y: 7,
                width: 6,
                height: 5
            }
        );
        assert_eq!(contours[2].bbox.x, 30);
    }

    #[test]
    fn diagonal_touching_squares_form_one_component() {
        // checkerboard light squares only meet at corners
        let mut img = GrayImage::new(12, 12);
        for cy in 0..4 {
            for cx in 0..4 {
                if (cx + cy) % 2 == 0 {
                    fill(&mut img, 1 + cx * 2, 1 + cy * 2, 2, 2, 255);
                }
            }
        }
        let outer: Vec<Contour> = ContourScanner::new(img)
            .filter(|c| c.kind == ContourKind::Outer)
            .collect();
        assert_eq!(outer.len(), 1);
        assert_eq!(outer[0].bbox.width, 8);
        assert_eq!(outer[0].bbox.height, 8);
    }

    #[test]
    fn empty_mask_has_no_contours() {
        assert_eq!(ContourScanner::new(GrayImage::new(10, 10)).count(), 0);
    }
}
