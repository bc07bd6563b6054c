//! Integration tests for the vifq CLI.

use std::path::PathBuf;
use std::process::Command;

fn vifq_bin() -> &'static str {
    env!("CARGO_BIN_EXE_vifq")
}

/// Writes a grayscale PNG with a deterministic pattern and returns its path.
fn write_test_png(name: &str, width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("vifq-cli-test-{}-{name}", std::process::id()));
    path.set_extension("png");

    let mut data = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            data.push(f(x, y));
        }
    }
    image::save_buffer(&path, &data, width, height, image::ExtendedColorType::L8)
        .expect("failed to write test png");
    path
}

#[test]
fn identical_images_score_one_at_every_scale() {
    let a = write_test_png("ident-a", 64, 64, |x, y| ((x * 3 + y * 5) % 251) as u8);
    let b = write_test_png("ident-b", 64, 64, |x, y| ((x * 3 + y * 5) % 251) as u8);

    let output = Command::new(vifq_bin())
        .args(["--quiet"])
        .arg(&a)
        .arg(&b)
        .output()
        .expect("failed to run vifq");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).unwrap();
    let scores: Vec<f64> = stdout
        .lines()
        .map(|l| l.trim().parse().expect("score line"))
        .collect();
    assert_eq!(scores.len(), 4);
    for s in scores {
        assert!((s - 1.0).abs() < 5e-3, "score {s}");
    }

    let _ = std::fs::remove_file(a);
    let _ = std::fs::remove_file(b);
}

#[test]
fn json_output_contains_all_scales() {
    let a = write_test_png("json-a", 32, 32, |x, _| (x * 8) as u8);
    let b = write_test_png("json-b", 32, 32, |x, _| (x * 8).saturating_sub(4) as u8);

    let output = Command::new(vifq_bin())
        .args(["--json"])
        .arg(&a)
        .arg(&b)
        .output()
        .expect("failed to run vifq");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    for key in ["scale0", "scale1", "scale2", "scale3"] {
        assert!(
            parsed["scores"][key].is_number(),
            "missing scores.{key} in {stdout}"
        );
    }
    assert_eq!(parsed["width"], 32);
    assert_eq!(parsed["height"], 32);
    assert_eq!(parsed["bit_depth"], 8);

    let _ = std::fs::remove_file(a);
    let _ = std::fs::remove_file(b);
}

#[test]
fn min_score_gate_fails_on_damaged_image() {
    // Checkerboard versus its inverse destroys fine-scale information, so a
    // strict threshold must trip with exit code 1.
    let a = write_test_png("gate-a", 64, 64, |x, y| {
        if (x / 2 + y / 2) % 2 == 0 {
            200
        } else {
            50
        }
    });
    let b = write_test_png("gate-b", 64, 64, |x, y| {
        if (x / 2 + y / 2) % 2 == 0 {
            50
        } else {
            200
        }
    });

    let output = Command::new(vifq_bin())
        .args(["--min-score", "0.99"])
        .arg(&a)
        .arg(&b)
        .output()
        .expect("failed to run vifq");

    assert_eq!(output.status.code(), Some(1));

    let _ = std::fs::remove_file(a);
    let _ = std::fs::remove_file(b);
}

#[test]
fn dimension_mismatch_is_an_error() {
    let a = write_test_png("dim-a", 64, 64, |_, _| 128);
    let b = write_test_png("dim-b", 32, 32, |_, _| 128);

    let output = Command::new(vifq_bin())
        .arg(&a)
        .arg(&b)
        .output()
        .expect("failed to run vifq");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("dimension mismatch"), "stderr: {stderr}");

    let _ = std::fs::remove_file(a);
    let _ = std::fs::remove_file(b);
}

#[test]
fn missing_file_is_an_error() {
    let a = write_test_png("missing-a", 32, 32, |_, _| 128);

    let output = Command::new(vifq_bin())
        .arg(&a)
        .arg("definitely-not-a-real-file.png")
        .output()
        .expect("failed to run vifq");

    assert_eq!(output.status.code(), Some(2));

    let _ = std::fs::remove_file(a);
}
