//! The session state machine.
//!
//! ```text
//! Idle --locate_board--> Located --build_reference--> Referenced --detect--> Tracking
//!  ^                                                                            |
//!  +------------------------------------ close ---------------------------------+
//! ```
//!
//! A failed operation leaves the phase as it was, except for `locate_board`
//! which always starts from `Idle` and stays there when no board is found.
//! Orientation is session-wide and survives `close`.

use crate::capture::{CaptureError, PointerControl, ScreenCapture};
use crate::config::ChessGridConfig;
use chess_grid_core::{
    BoardRegion, BoardSquare, ColorImageView, ImageError, ImageThresholder, Orientation,
    PieceColor, PixelLayout, SampleError, SquareSampler, ThresholdedImage,
};
use chess_grid_detect::{
    BoardClassification, BoardLocator, ClassificationThresholds, PieceClassifier,
    ReferenceFailure,
};
use chess_grid_tracker::{BoardPosition, BoardStateTracker, MoveSquares, TrackerError};
use image::RgbaImage;

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("no chessboard found in the active window")]
    BoardNotFound,
    #[error("reference detection failed: {}", describe_failures(.failures))]
    ReferenceDetection { failures: Vec<ReferenceFailure> },
    #[error("invalid move: {notation}")]
    InvalidMoveNotation { notation: String },
    #[error("{operation} requires {required} (session is {phase})")]
    Precondition {
        operation: &'static str,
        required: &'static str,
        phase: &'static str,
    },
    #[error("invalid square coordinates {tokens:?}")]
    InvalidCoordinate { tokens: Vec<String> },
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Sample(#[from] SampleError),
    #[error(transparent)]
    Image(#[from] ImageError),
}

impl From<TrackerError> for SessionError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::InvalidMoveNotation { notation } => {
                SessionError::InvalidMoveNotation { notation }
            }
        }
    }
}

fn describe_failures(failures: &[ReferenceFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Where the session is in its lifecycle, with the data that phase owns.
#[derive(Clone, Debug, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Located {
        region: BoardRegion,
    },
    /// Signatures exist; they may be partial if referencing reported failures.
    Referenced {
        region: BoardRegion,
        classifier: PieceClassifier,
    },
    Tracking {
        region: BoardRegion,
        classifier: PieceClassifier,
        tracker: BoardStateTracker,
    },
}

impl SessionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Located { .. } => "located",
            SessionPhase::Referenced { .. } => "referenced",
            SessionPhase::Tracking { .. } => "tracking",
        }
    }

    pub fn region(&self) -> Option<BoardRegion> {
        match self {
            SessionPhase::Idle => None,
            SessionPhase::Located { region }
            | SessionPhase::Referenced { region, .. }
            | SessionPhase::Tracking { region, .. } => Some(*region),
        }
    }

    pub fn tracker(&self) -> Option<&BoardStateTracker> {
        match self {
            SessionPhase::Tracking { tracker, .. } => Some(tracker),
            _ => None,
        }
    }
}

/// Drives locate, reference, detect and move against a screen and a pointer.
pub struct ChessGridSession<C, P> {
    capture: C,
    pointer: P,
    locator: BoardLocator,
    thresholder: ImageThresholder,
    thresholds: ClassificationThresholds,
    orientation: Orientation,
    phase: SessionPhase,
}

impl<C: ScreenCapture, P: PointerControl> ChessGridSession<C, P> {
    pub fn new(capture: C, pointer: P, config: ChessGridConfig) -> Self {
        Self {
            capture,
            pointer,
            locator: BoardLocator::new(config.locator),
            thresholder: ImageThresholder::new(config.thresholds.intensity()),
            thresholds: config.thresholds,
            orientation: Orientation::Normal,
            phase: SessionPhase::Idle,
        }
    }

    pub fn with_defaults(capture: C, pointer: P) -> Self {
        Self::new(capture, pointer, ChessGridConfig::default())
    }

    #[inline]
    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    #[inline]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn capture(&self) -> &C {
        &self.capture
    }

    pub fn capture_mut(&mut self) -> &mut C {
        &mut self.capture
    }

    pub fn pointer(&self) -> &P {
        &self.pointer
    }

    pub fn pointer_mut(&mut self) -> &mut P {
        &mut self.pointer
    }

    /// Find the board in the foreground window. Any previous state is dropped.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub fn locate_board(&mut self) -> Result<BoardRegion, SessionError> {
        self.close();

        let window = self.capture.active_window_bounds()?;
        let pixels = self.capture.capture_region(window)?;
        let gray = chess_grid_core::to_grayscale(&rgba_view(&pixels)?);

        let region = self
            .locator
            .locate(window, &gray.view())
            .ok_or(SessionError::BoardNotFound)?;
        self.phase = SessionPhase::Located { region };
        Ok(region)
    }

    /// Locate the board, set the orientation and learn piece signatures from
    /// the starting position, then run a first detection.
    ///
    /// When some reference squares fail their coverage test the partial
    /// signature set is kept, the session stays `Referenced` and no
    /// detection is run.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub fn build_reference(
        &mut self,
        orientation: Orientation,
    ) -> Result<BoardPosition, SessionError> {
        let region = self.locate_board()?;
        self.orientation = orientation;

        let masks = capture_masks(&mut self.capture, &self.thresholder, region)?;
        let sampler = SquareSampler::for_board_side(region.side())?;
        let mut classifier = PieceClassifier::new(self.thresholds);
        let failures = classifier.build_reference(&masks, &sampler, orientation)?;

        self.phase = SessionPhase::Referenced { region, classifier };
        if !failures.is_empty() {
            return Err(SessionError::ReferenceDetection { failures });
        }
        self.detect()
    }

    /// Re-classify every square and rebuild the tracked position.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub fn detect(&mut self) -> Result<BoardPosition, SessionError> {
        let (region, classifier, tracker) = match std::mem::take(&mut self.phase) {
            SessionPhase::Referenced { region, classifier } => (region, classifier, None),
            SessionPhase::Tracking {
                region,
                classifier,
                tracker,
            } => (region, classifier, Some(tracker)),
            other => {
                self.phase = other;
                return Err(self.precondition("detect", "a reference"));
            }
        };

        match self.classify(region, &classifier) {
            Ok(classification) => {
                let mut tracker = tracker.unwrap_or_default();
                let position = tracker.rebuild(&classification, self.orientation).clone();
                self.phase = SessionPhase::Tracking {
                    region,
                    classifier,
                    tracker,
                };
                Ok(position)
            }
            Err(err) => {
                self.phase = match tracker {
                    Some(tracker) => SessionPhase::Tracking {
                        region,
                        classifier,
                        tracker,
                    },
                    None => SessionPhase::Referenced { region, classifier },
                };
                Err(err)
            }
        }
    }

    fn classify(
        &mut self,
        region: BoardRegion,
        classifier: &PieceClassifier,
    ) -> Result<BoardClassification, SessionError> {
        let masks = capture_masks(&mut self.capture, &self.thresholder, region)?;
        let sampler = SquareSampler::for_board_side(region.side())?;
        Ok(classifier.classify_board(&masks, &sampler)?)
    }

    /// Detect, resolve the spoken move and click its from and to squares.
    ///
    /// `hint` is the side believed to be moving; the opposite side is tried
    /// when the move is not legal for it. Nothing is clicked on failure.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self, tokens)))]
    pub fn apply_move<S: AsRef<str>>(
        &mut self,
        tokens: &[S],
        hint: PieceColor,
    ) -> Result<MoveSquares, SessionError> {
        if !matches!(
            self.phase,
            SessionPhase::Referenced { .. } | SessionPhase::Tracking { .. }
        ) {
            return Err(self.precondition("apply_move", "a reference"));
        }
        self.detect()?;

        let (region, resolved) = match &self.phase {
            SessionPhase::Tracking {
                region, tracker, ..
            } => (*region, tracker.apply_move(tokens, hint)),
            _ => return Err(self.precondition("apply_move", "a detected position")),
        };
        let m = resolved?;

        self.click_square(region, m.from)?;
        self.click_square(region, m.to)?;
        Ok(m)
    }

    /// Click squares given as spoken coordinates: `["e", "2"]` or
    /// `["e", "2", "e", "4"]`.
    pub fn click_squares<S: AsRef<str>>(
        &mut self,
        tokens: &[S],
    ) -> Result<Vec<BoardSquare>, SessionError> {
        let Some(region) = self.phase.region() else {
            return Err(self.precondition("click_squares", "a located board"));
        };
        let squares = parse_coordinates(tokens).ok_or_else(|| SessionError::InvalidCoordinate {
            tokens: tokens.iter().map(|t| t.as_ref().to_string()).collect(),
        })?;
        for &square in &squares {
            self.click_square(region, square)?;
        }
        Ok(squares)
    }

    /// Set the orientation, or toggle it when `orientation` is `None`.
    pub fn flip_board(&mut self, orientation: Option<Orientation>) -> Orientation {
        self.orientation = orientation.unwrap_or_else(|| self.orientation.toggled());
        log::info!("board orientation is now {:?}", self.orientation);
        self.orientation
    }

    /// Drop the region, signatures and position.
    pub fn close(&mut self) {
        if !matches!(self.phase, SessionPhase::Idle) {
            log::debug!("closing {} session", self.phase.name());
        }
        self.phase = SessionPhase::Idle;
    }

    /// Diagnostic rendering of the tracked position, as it appears on screen.
    pub fn render(&self) -> Option<String> {
        self.phase
            .tracker()
            .map(|t| t.position().render(self.orientation))
    }

    pub fn fen(&self) -> Option<String> {
        self.phase.tracker().map(|t| t.position().fen())
    }

    fn click_square(
        &mut self,
        region: BoardRegion,
        square: BoardSquare,
    ) -> Result<(), SessionError> {
        let (x, y) = region.square_center(self.orientation.to_index(square));
        log::info!("click {square} at ({x}, {y})");
        self.pointer.move_cursor_and_click(x, y)?;
        Ok(())
    }

    fn precondition(&self, operation: &'static str, required: &'static str) -> SessionError {
        log::warn!("{operation} called while {}", self.phase.name());
        SessionError::Precondition {
            operation,
            required,
            phase: self.phase.name(),
        }
    }
}

fn rgba_view(pixels: &RgbaImage) -> Result<ColorImageView<'_>, ImageError> {
    ColorImageView::new(
        pixels.width() as usize,
        pixels.height() as usize,
        PixelLayout::Rgba,
        pixels.as_raw(),
    )
}

fn capture_masks<C: ScreenCapture>(
    capture: &mut C,
    thresholder: &ImageThresholder,
    region: BoardRegion,
) -> Result<ThresholdedImage, SessionError> {
    let pixels = capture.capture_region(region.rect())?;
    Ok(thresholder.apply(&rgba_view(&pixels)?))
}

/// Two or four single-character tokens, alternating file and rank.
fn parse_coordinates<S: AsRef<str>>(tokens: &[S]) -> Option<Vec<BoardSquare>> {
    if tokens.len() != 2 && tokens.len() != 4 {
        return None;
    }
    let single = |t: &S| {
        let mut chars = t.as_ref().trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    };
    tokens
        .chunks(2)
        .map(|pair| BoardSquare::from_chars(single(&pair[0])?, single(&pair[1])?))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_need_two_or_four_valid_tokens() {
        let squares = parse_coordinates(&["e", "2", "e", "4"]).expect("valid");
        assert_eq!(
            squares.iter().map(ToString::to_string).collect::<Vec<_>>(),
            ["e2", "e4"]
        );
        assert!(parse_coordinates(&["e"]).is_none());
        assert!(parse_coordinates(&["e", "2", "e"]).is_none());
        assert!(parse_coordinates(&["i", "2"]).is_none());
        assert!(parse_coordinates(&["e", "9"]).is_none());
        assert!(parse_coordinates(&["e2", "e4"]).is_none());
    }

    #[test]
    fn phase_names() {
        assert_eq!(SessionPhase::default().name(), "idle");
        assert!(SessionPhase::Idle.region().is_none());
    }
}
