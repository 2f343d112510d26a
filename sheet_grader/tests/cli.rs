use assert_cmd::Command;
use bubble_grader::GradingReport;
use image::{GrayImage, Luma};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut};
use predicates::prelude::*;
use std::path::Path;

fn sheet_grader() -> Command {
    Command::cargo_bin("sheet_grader").unwrap()
}

/// Draws a 4 question, 3 alternative, 2 block sheet with question `q` marked at
/// alternative `q % 3`. Bubbles have radius 10 on a 30 px pitch, rows 40 px apart.
fn write_marked_sheet(path: &Path) {
    const RADIUS: i32 = 10;
    let (rows, alternatives, blocks) = (2, 3, 2);
    let block_width = alternatives * 30 + 40;
    let mut sheet = GrayImage::from_pixel(
        (80 + blocks * block_width) as u32,
        (80 + rows * 40) as u32,
        Luma([255u8]),
    );

    for question in 0..rows * blocks {
        let (block, row) = (question / rows, question % rows);
        for alternative in 0..alternatives {
            let center = (40 + block * block_width + alternative * 30, 40 + row * 40);
            if alternative == question % alternatives {
                draw_filled_circle_mut(&mut sheet, center, RADIUS, Luma([0u8]));
            } else {
                draw_hollow_circle_mut(&mut sheet, center, RADIUS, Luma([0u8]));
            }
        }
    }
    sheet.save(path).unwrap();
}

#[test]
fn layout_prints_band_geometry() {
    sheet_grader()
        .args(["layout", "--questions", "4", "--alternatives", "3", "--column-blocks", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rows per column block: 2"))
        .stdout(predicate::str::contains("first band size:       6"))
        .stdout(predicate::str::contains("expected bubbles:      12"));
}

#[test]
fn layout_rounds_rows_up() {
    sheet_grader()
        .args(["layout", "--questions", "100", "--alternatives", "5", "--column-blocks", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rows per column block: 34"));
}

#[test]
fn layout_rejects_zero_counts() {
    sheet_grader()
        .args(["layout", "--questions", "0", "--alternatives", "5", "--column-blocks", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid layout"));
}

#[test]
fn layout_reads_a_sheet_definition() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sheet.json");
    std::fs::write(
        &path,
        r#"{"layout": {"question_count": 10, "alternatives_per_question": 4, "column_blocks": 3},
            "answer_key": [0, 1, 2, 3, 0, 1, 2, 3, 0, 1]}"#,
    )
    .unwrap();

    sheet_grader()
        .args(["layout", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("rows per column block: 4"))
        .stdout(predicate::str::contains("expected bubbles:      40"));
}

#[test]
fn grade_requires_an_answer_key() {
    sheet_grader()
        .args(["grade", "--image", "sheet.png"])
        .args(["--questions", "2", "--alternatives", "3", "--column-blocks", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--answer-key is required"));
}

#[test]
fn grade_rejects_a_key_of_the_wrong_length() {
    sheet_grader()
        .args(["grade", "--image", "sheet.png"])
        .args(["--questions", "3", "--alternatives", "4", "--column-blocks", "1"])
        .args(["--answer-key", "0,1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid answer key"));
}

#[test]
fn grade_rejects_an_out_of_range_answer() {
    sheet_grader()
        .args(["grade", "--image", "sheet.png"])
        .args(["--questions", "2", "--alternatives", "4", "--column-blocks", "1"])
        .args(["--answer-key", "0,4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("question 1 has answer 4"));
}

#[test]
fn grade_reports_a_missing_image() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.png");

    sheet_grader()
        .args(["grade", "--image"])
        .arg(&missing)
        .args(["--questions", "2", "--alternatives", "3", "--column-blocks", "1"])
        .args(["--answer-key", "0,1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to grade"));
}

#[test]
fn grade_reports_a_malformed_sheet_definition() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sheet.json");
    std::fs::write(&path, "{ not json").unwrap();

    sheet_grader()
        .args(["grade", "--image", "sheet.png", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("reading sheet definition"));
}

#[test]
fn grade_writes_json_report_and_debug_images() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("sheet.png");
    let out = dir.path().join("report.json");
    let debug = dir.path().join("debug");
    write_marked_sheet(&image);

    sheet_grader()
        .args(["grade", "--image"])
        .arg(&image)
        .args(["--questions", "4", "--alternatives", "3", "--column-blocks", "2"])
        .args(["--answer-key", "0,1,2,1", "--json", "--out"])
        .arg(&out)
        .arg("--debug-dir")
        .arg(&debug)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_correct\": 3"));

    let report: GradingReport =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(report.question_count, 4);
    assert_eq!(report.total_correct, 3);
    assert_eq!(report.results[&3].marked_alternative, Some(0));
    assert!(!report.results[&3].is_correct());

    for file in ["confirmation_card.png", "answer_key_card.png", "detection_overlay.png"] {
        assert!(debug.join(file).exists(), "{file} missing");
    }
}

#[test]
fn grade_prints_a_text_summary() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("sheet.png");
    write_marked_sheet(&image);

    sheet_grader()
        .args(["grade", "--image"])
        .arg(&image)
        .args(["--questions", "4", "--alternatives", "3", "--column-blocks", "2"])
        .args(["--answer-key", "0,1,2,1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("score: 3/4 (0 unanswered or ambiguous)"))
        .stdout(predicate::str::contains("question   3: marked  0  key  1  wrong"));
}
