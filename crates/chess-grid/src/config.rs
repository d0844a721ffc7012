//! JSON configuration and report helpers.

use chess_grid_core::{BoardRegion, Orientation};
use chess_grid_detect::{ClassificationThresholds, LocatorParams, ReferenceFailure};
use chess_grid_tracker::MoveSquares;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Every tunable of a session. Missing fields take their defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChessGridConfig {
    pub locator: LocatorParams,
    pub thresholds: ClassificationThresholds,
}

impl ChessGridConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveReport {
    pub san: String,
    pub from: String,
    pub to: String,
    pub mover: String,
    /// Screen points clicked, in order.
    pub clicks: Vec<[i32; 2]>,
}

impl MoveReport {
    pub fn new(m: &MoveSquares, clicks: &[(i32, i32)]) -> Self {
        Self {
            san: m.san.clone(),
            from: m.from.to_string(),
            to: m.to.to_string(),
            mover: m.mover.name().to_string(),
            clicks: clicks.iter().map(|&(x, y)| [x, y]).collect(),
        }
    }
}

/// What the CLI prints after a run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    pub image_path: String,
    #[serde(default)]
    pub region: Option<BoardRegion>,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub fen: Option<String>,
    /// Diagnostic rendering, one string per rendered row.
    #[serde(default)]
    pub board: Vec<String>,
    #[serde(default)]
    pub reference_failures: Vec<String>,
    #[serde(default, rename = "move")]
    pub mv: Option<MoveReport>,
    #[serde(default)]
    pub error: Option<String>,
}

impl DetectionReport {
    pub fn new(image_path: &Path, orientation: Orientation) -> Self {
        Self {
            image_path: image_path.to_string_lossy().into_owned(),
            orientation,
            ..Self::default()
        }
    }

    /// Record FEN and rendering of a detected position.
    pub fn set_position(&mut self, fen: String, rendered: &str) {
        self.fen = Some(fen);
        self.board = rendered.lines().map(str::to_string).collect();
    }

    pub fn set_reference_failures(&mut self, failures: &[ReferenceFailure]) {
        self.reference_failures = failures.iter().map(ToString::to_string).collect();
    }

    /// Record an error; the rest of the report keeps what was found before it.
    pub fn set_error(&mut self, err: impl std::fmt::Display) {
        self.error = Some(err.to_string());
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: ChessGridConfig =
            serde_json::from_str(r#"{"thresholds": {"dark_match_distance": 4500.0}}"#)
                .expect("json");
        assert_eq!(cfg.thresholds.dark_match_distance, 4500.0);
        assert_eq!(cfg.thresholds.light_match_distance, 2000.0);
        assert_eq!(cfg.locator, LocatorParams::default());
    }

    #[test]
    fn report_serializes_move_field_name() {
        let report = DetectionReport {
            mv: Some(MoveReport {
                san: "Nc3".into(),
                from: "b1".into(),
                to: "c3".into(),
                mover: "white".into(),
                clicks: vec![[1, 2], [3, 4]],
            }),
            ..DetectionReport::default()
        };
        let json = serde_json::to_value(&report).expect("json");
        assert_eq!(json["move"]["from"], "b1");
        assert_eq!(json["orientation"], "normal");
    }
}
