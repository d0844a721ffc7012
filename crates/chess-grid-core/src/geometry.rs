use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of squares along one board side.
pub const BOARD_SQUARES: usize = 8;

/// Axis-aligned rectangle in absolute screen pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ScreenRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Detected square board area in absolute screen pixels.
///
/// Always square with a positive side; build it through [`BoardRegion::new`]
/// or [`BoardRegion::centered_in`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardRegion {
    origin_x: i32,
    origin_y: i32,
    side: u32,
}

impl BoardRegion {
    pub fn new(origin_x: i32, origin_y: i32, side: u32) -> Option<Self> {
        (side > 0).then_some(Self {
            origin_x,
            origin_y,
            side,
        })
    }

    /// Largest square centered inside a `width × height` box whose top-left
    /// corner sits at `(x, y)`.
    pub fn centered_in(x: i32, y: i32, width: u32, height: u32) -> Option<Self> {
        let side = width.min(height);
        let dx = ((width - side) / 2) as i32;
        let dy = ((height - side) / 2) as i32;
        Self::new(x + dx, y + dy, side)
    }

    #[inline]
    pub fn origin(&self) -> (i32, i32) {
        (self.origin_x, self.origin_y)
    }

    #[inline]
    pub fn side(&self) -> u32 {
        self.side
    }

    /// Side of one square, floor-divided; border remainder pixels are dropped.
    #[inline]
    pub fn square_size(&self) -> u32 {
        self.side / BOARD_SQUARES as u32
    }

    pub fn rect(&self) -> ScreenRect {
        ScreenRect::new(self.origin_x, self.origin_y, self.side, self.side)
    }

    /// Screen position of the center of a rendered square.
    pub fn square_center(&self, index: SquareIndex) -> (i32, i32) {
        let sq = self.square_size() as i32;
        (
            self.origin_x + index.col() as i32 * sq + sq / 2,
            self.origin_y + index.row() as i32 * sq + sq / 2,
        )
    }
}

/// Position of a rendered square: row 0 is the top row, column 0 the left column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SquareIndex {
    row: u8,
    col: u8,
}

impl SquareIndex {
    pub fn new(row: usize, col: usize) -> Option<Self> {
        (row < BOARD_SQUARES && col < BOARD_SQUARES).then_some(Self {
            row: row as u8,
            col: col as u8,
        })
    }

    #[inline]
    pub fn row(self) -> usize {
        self.row as usize
    }

    #[inline]
    pub fn col(self) -> usize {
        self.col as usize
    }

    /// Row-major position in `0..64`.
    #[inline]
    pub fn linear(self) -> usize {
        self.row() * BOARD_SQUARES + self.col()
    }

    /// All 64 indices in row-major order.
    pub fn all() -> impl Iterator<Item = SquareIndex> {
        (0..BOARD_SQUARES * BOARD_SQUARES).map(|i| SquareIndex {
            row: (i / BOARD_SQUARES) as u8,
            col: (i % BOARD_SQUARES) as u8,
        })
    }
}

/// Algebraic board square; `file` 0 is the a-file, `rank` 0 is rank 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoardSquare {
    file: u8,
    rank: u8,
}

impl BoardSquare {
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        ((file as usize) < BOARD_SQUARES && (rank as usize) < BOARD_SQUARES)
            .then_some(Self { file, rank })
    }

    #[inline]
    pub fn file(self) -> u8 {
        self.file
    }

    #[inline]
    pub fn rank(self) -> u8 {
        self.rank
    }

    /// Build from a file letter and a rank digit, e.g. `('e', '2')`.
    pub fn from_chars(file: char, rank: char) -> Option<Self> {
        let file = file.to_ascii_lowercase();
        if !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
            return None;
        }
        Self::new(file as u8 - b'a', rank as u8 - b'1')
    }
}

impl fmt::Display for BoardSquare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file) as char, self.rank + 1)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid board square {0:?}")]
pub struct ParseSquareError(pub String);

impl FromStr for BoardSquare {
    type Err = ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(f), Some(r), None) => {
                Self::from_chars(f, r).ok_or_else(|| ParseSquareError(s.to_string()))
            }
            _ => Err(ParseSquareError(s.to_string())),
        }
    }
}

/// Which side of the board is rendered at the bottom of the screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// White at the bottom: row 7 holds rank 1, column 0 the a-file.
    #[default]
    Normal,
    /// Black at the bottom: row 7 holds rank 8, column 0 the h-file.
    Flipped,
}

impl Orientation {
    #[inline]
    pub fn toggled(self) -> Self {
        match self {
            Orientation::Normal => Orientation::Flipped,
            Orientation::Flipped => Orientation::Normal,
        }
    }

    pub fn to_square(self, index: SquareIndex) -> BoardSquare {
        let last = (BOARD_SQUARES - 1) as u8;
        match self {
            Orientation::Normal => BoardSquare {
                file: index.col,
                rank: last - index.row,
            },
            Orientation::Flipped => BoardSquare {
                file: last - index.col,
                rank: index.row,
            },
        }
    }

    pub fn to_index(self, square: BoardSquare) -> SquareIndex {
        let last = (BOARD_SQUARES - 1) as u8;
        match self {
            Orientation::Normal => SquareIndex {
                row: last - square.rank,
                col: square.file,
            },
            Orientation::Flipped => SquareIndex {
                row: square.rank,
                col: last - square.file,
            },
        }
    }
}
