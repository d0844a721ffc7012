mod common;

use assert_cmd::Command;
use chess_grid::Orientation;
use common::*;
use predicates::prelude::*;
use tempfile::tempdir;

fn cli() -> Command {
    Command::cargo_bin("chess-grid").expect("binary")
}

#[test]
fn detect_prints_start_fen() {
    let dir = tempdir().expect("tempdir");
    let start = dir.path().join("start.png");
    render_screen(&start_pieces(), Orientation::Normal)
        .save(&start)
        .expect("png");

    cli()
        .args(["detect", "--reference"])
        .arg(&start)
        .assert()
        .success()
        .stdout(predicate::str::contains(START_FEN));
}

#[test]
fn move_reports_squares_and_clicks() {
    let dir = tempdir().expect("tempdir");
    let start = dir.path().join("start.png");
    render_screen(&start_pieces(), Orientation::Normal)
        .save(&start)
        .expect("png");
    let report = dir.path().join("report.json");

    cli()
        .args(["move", "--color", "white", "--reference"])
        .arg(&start)
        .arg("--output")
        .arg(&report)
        .args(["n", "c", "3"])
        .assert()
        .success();

    let loaded = chess_grid::DetectionReport::load_json(&report).expect("report");
    let mv = loaded.mv.expect("move");
    assert_eq!((mv.from.as_str(), mv.to.as_str()), ("b1", "c3"));
    assert_eq!(mv.clicks, vec![[110, 330], [150, 250]]);
}

#[test]
fn locate_without_board_fails() {
    let dir = tempdir().expect("tempdir");
    let blank = dir.path().join("blank.png");
    image::RgbaImage::new(200, 200).save(&blank).expect("png");

    cli()
        .arg("locate")
        .arg(&blank)
        .assert()
        .failure()
        .stdout(predicate::str::contains("no chessboard found"));
}

#[test]
fn window_crop_keeps_screen_coordinates() {
    let dir = tempdir().expect("tempdir");
    let start = dir.path().join("start.png");
    render_screen(&start_pieces(), Orientation::Normal)
        .save(&start)
        .expect("png");

    cli()
        .arg("locate")
        .arg(&start)
        .args(["--window", "20,10,480,390"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"origin_x\": 50"));
}
