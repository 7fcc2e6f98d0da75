use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn write_camera(root: &std::path::Path, name: &str, descriptor: &str, geometry: Option<&str>) {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{name}.json")), descriptor).unwrap();
    if let Some(geometry) = geometry {
        fs::write(dir.join("geometry.json"), geometry).unwrap();
    }
}

#[test]
fn cameras_lists_resolved_profiles() {
    let tmp = tempfile::tempdir().unwrap();
    write_camera(
        tmp.path(),
        "photonfocus_nir",
        r#"{
            "make": "Photonfocus",
            "model": "MV1-D2048x1088-HS02",
            "sensor_class": "mosaic",
            "focal_length_mm": 16.0,
            "image_topic": "/ssf/photonfocus_camera_nir_node/image_raw",
            "default_exposure_ms": 4.0
        }"#,
        Some(
            r#"{
                "height": 1080, "width": 2040,
                "offset_x": 4, "offset_y": 4,
                "pattern_width": 5, "pattern_height": 5
            }"#,
        ),
    );

    let mut cmd = Command::cargo_bin("bag2img").unwrap();
    cmd.arg("cameras")
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("photonfocus_nir"))
        .stdout(predicate::str::contains("mosaic"))
        .stdout(predicate::str::contains("25"));
}

#[test]
fn cameras_fails_without_configuration() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = tmp.path().join("nowhere");

    let mut cmd = Command::cargo_bin("bag2img").unwrap();
    cmd.arg("cameras")
        .arg(&missing)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no camera configuration found"));
}

#[test]
fn cameras_reports_broken_descriptor_and_continues() {
    let tmp = tempfile::tempdir().unwrap();
    write_camera(
        tmp.path(),
        "sony_rgb",
        r#"{
            "make": "Sony", "model": "A7", "sensor_class": "standard",
            "focal_length_mm": 35.0,
            "image_topic": "/sony/image_raw",
            "default_exposure_ms": 2.0
        }"#,
        None,
    );
    write_camera(tmp.path(), "broken", "{ not json", None);

    let mut cmd = Command::cargo_bin("bag2img").unwrap();
    cmd.arg("cameras")
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("sony_rgb"))
        .stderr(predicate::str::contains("broken"));
}

#[test]
fn extract_fails_on_missing_bag() {
    let tmp = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("bag2img").unwrap();
    cmd.args(["extract", "does_not_exist.bag"])
        .arg(tmp.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open bag"));
}
