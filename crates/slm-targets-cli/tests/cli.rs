use assert_cmd::Command;
use predicates::prelude::*;

fn cli() -> Command {
    Command::cargo_bin("slm-targets").expect("binary")
}

fn write_points(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("points.json");
    std::fs::write(
        &path,
        r#"{"calibration": [[0, 0], [100, 100]], "camera": [[0, 0], [50, 50]]}"#,
    )
    .expect("write points");
    path
}

fn write_targets(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("targets.json");
    std::fs::write(&path, "[[25, 25], [4, 4]]").expect("write targets");
    path
}

#[test]
fn calibrate_writes_a_readable_record() {
    let dir = tempfile::tempdir().expect("tempdir");
    let points = write_points(dir.path());
    let out = dir.path().join("calibration.txt");

    cli()
        .args(["calibrate", "--camera-width", "256", "--output-size", "213"])
        .arg("--points")
        .arg(&points)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let text = std::fs::read_to_string(&out).expect("record");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[5], "2"); // scale_x
    assert_eq!(lines[10], "213"); // output size
    assert_eq!(lines[12], "false"); // flip horizontal
}

#[test]
fn calibrate_rejects_degenerate_points() {
    let dir = tempfile::tempdir().expect("tempdir");
    let points = dir.path().join("points.json");
    std::fs::write(
        &points,
        r#"{"calibration": [[0, 0], [100, 100]], "camera": [[0, 0], [0, 5]]}"#,
    )
    .expect("write points");

    cli()
        .args(["calibrate", "--camera-width", "256"])
        .arg("--points")
        .arg(&points)
        .arg("--out")
        .arg(dir.path().join("calibration.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("DegenerateAxis"));
}

#[test]
fn map_then_extract_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let points = write_points(dir.path());
    let targets = write_targets(dir.path());
    let record = dir.path().join("calibration.txt");

    cli()
        .args(["calibrate", "--camera-width", "64"])
        .arg("--points")
        .arg(&points)
        .arg("--out")
        .arg(&record)
        .assert()
        .success();

    // Map: targets selected in a 64-pixel source image.
    let mask = dir.path().join("mask.png");
    let mapped = dir.path().join("mapped.json");
    cli()
        .args(["map", "--source-height", "64"])
        .arg("--calibration")
        .arg(&record)
        .arg("--targets")
        .arg(&targets)
        .arg("--mask-out")
        .arg(&mask)
        .arg("--mapped-out")
        .arg(&mapped)
        .assert()
        .success();

    let coords: Vec<[i32; 2]> =
        serde_json::from_str(&std::fs::read_to_string(&mapped).expect("mapped")).expect("json");
    assert_eq!(coords, vec![[50, 50], [8, 8]]);
    assert!(mask.exists());

    // Extract from two synthetic 64x64 frames.
    let mut frame_paths = Vec::new();
    for (i, value) in [40u8, 90u8].iter().enumerate() {
        let img = image::GrayImage::from_pixel(64, 64, image::Luma([*value]));
        let path = dir.path().join(format!("frame{i}.png"));
        img.save(&path).expect("save frame");
        frame_paths.push(path);
    }

    let report_path = dir.path().join("traces.json");
    let mut cmd = cli();
    cmd.args(["extract", "--radius", "1", "--k", "9", "--plot-scale", "100"])
        .arg("--targets")
        .arg(&targets)
        .arg("--out")
        .arg(&report_path)
        .arg("--frames");
    for p in &frame_paths {
        cmd.arg(p);
    }
    cmd.assert().success();

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).expect("report"))
            .expect("json");
    assert_eq!(report["targets"], 2);
    assert_eq!(report["frames"], 2);
    // Uniform frames: every 3x3 window sums to 9 * intensity (widened to 16-bit).
    let first = report["matrix"][0][0].as_f64().expect("cell");
    assert_eq!(first, 9.0 * 40.0 * 257.0);
    assert!(report["normalized"][0].is_array());
}

#[test]
fn extract_rejects_zero_radius() {
    let dir = tempfile::tempdir().expect("tempdir");
    let targets = write_targets(dir.path());
    let img = image::GrayImage::from_pixel(8, 8, image::Luma([1]));
    let frame = dir.path().join("frame.png");
    img.save(&frame).expect("save frame");

    cli()
        .args(["extract", "--radius", "0"])
        .arg("--targets")
        .arg(&targets)
        .arg("--frames")
        .arg(&frame)
        .arg("--out")
        .arg(dir.path().join("traces.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("radius"));
}
