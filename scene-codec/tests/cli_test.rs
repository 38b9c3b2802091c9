//! Integration tests for the scene-codec binary
//!
//! Files are produced with the library, then inspected, extracted and
//! repacked through the command line.

mod fixtures;

use std::path::Path;
use std::process::{Command, Output};

use scene_codec::DecodedModel;
use tempfile::tempdir;

use fixtures::*;

fn scene_codec(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_scene-codec"))
        .args(args)
        .output()
        .expect("Failed to run scene-codec")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp path is not UTF-8")
}

fn write_static_file(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("level.scene");
    let texture = checker_texture();
    let data = lossless_codec()
        .encode_static(&static_scene(&texture), Some(&thumbnail()))
        .expect("Failed to encode static scene");
    std::fs::write(&path, data).expect("Failed to write scene file");
    path
}

fn write_avatar_file(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("hero.avatar");
    let data = lossless_codec()
        .encode_avatar(&avatar_scene(), &thumbnail())
        .expect("Failed to encode avatar");
    std::fs::write(&path, data).expect("Failed to write avatar file");
    path
}

#[test]
fn test_inspect_prints_tree() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_static_file(dir.path());

    let output = scene_codec(&["inspect", path_str(&input)]);
    assert!(output.status.success(), "inspect failed: {output:?}");
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("static model, 8 nodes"));
    assert!(stdout.contains("  floor  mesh 4v/2t  [HDRP/Lit]"));
    assert!(stdout.contains("    leaves"));
}

#[test]
fn test_inspect_json() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_avatar_file(dir.path());

    let output = scene_codec(&["inspect", "--json", path_str(&input)]);
    assert!(output.status.success(), "inspect --json failed: {output:?}");
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("inspect --json is not JSON");

    assert_eq!(value["kind"], "avatar");
    assert_eq!(value["node_count"], 9);
    assert_eq!(value["thumbnail"], serde_json::json!([8, 8]));
    assert_eq!(value["nodes"][0]["name"], "Avatar");
    assert_eq!(
        value["controller"]["states"],
        serde_json::json!(["Idle", "Run", "Jump"])
    );
    assert_eq!(value["controller"]["transitions"], 4);
}

#[test]
fn test_thumbnail_extraction() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_avatar_file(dir.path());
    let png = dir.path().join("thumb.png");

    let output = scene_codec(&["thumbnail", path_str(&input), "-o", path_str(&png)]);
    assert!(output.status.success(), "thumbnail failed: {output:?}");

    let image = image::open(&png).expect("Failed to open thumbnail").to_rgba8();
    assert_eq!(image, thumbnail());
}

#[test]
fn test_repack_with_config() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_static_file(dir.path());
    let repacked = dir.path().join("repacked.scene");
    let config = dir.path().join("scene-codec.toml");
    std::fs::write(
        &config,
        "[texture]\npayload = \"png\"\nsplit_alpha = false\n\n[compression]\nlevel = 9\n",
    )
    .unwrap();

    let output = scene_codec(&[
        "--config",
        path_str(&config),
        "repack",
        path_str(&input),
        "-o",
        path_str(&repacked),
    ]);
    assert!(output.status.success(), "repack failed: {output:?}");

    let data = std::fs::read(&repacked).expect("Failed to read repacked file");
    let DecodedModel::Static(model) = lossless_codec().decode_any(&data).unwrap() else {
        panic!("repack changed the model kind");
    };
    assert_eq!(model.texture_encoding, scene_common::TextureEncoding::NoAlpha);
    let names: Vec<_> = model.nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, ["floor", "tree", "lamp", "prop"]);
    assert_eq!(model.nodes[0].geometry.as_ref(), Some(&quad()));
}

#[test]
fn test_missing_input_fails() {
    let dir = tempdir().expect("Failed to create temp dir");
    let missing = dir.path().join("missing.scene");

    let output = scene_codec(&["inspect", path_str(&missing)]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read"));
}

#[test]
fn test_invalid_config_fails() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_static_file(dir.path());
    let config = dir.path().join("bad.toml");
    std::fs::write(&config, "[compression]\nlevel = 12\n").unwrap();

    let output = scene_codec(&["--config", path_str(&config), "inspect", path_str(&input)]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load config"));
}
