use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

const MARBLE_PROFILE: &str = r#"
screen_width = 800
screen_height = 600
display_hand = "rh"
trough_speed = 0.25

[course]
targets = [20.0, -20.0]
"#;

const WEDGE_PROFILE: &str = r#"
task_radius = 0.7
target_pos = [-45.0, 45.0]
"#;

fn marbletask(config_dir: &Path, args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_marbletask"))
        .current_dir(config_dir)
        .env("MARBLETASK_CONFIG_DIR", config_dir)
        .env("RUST_LOG", "warn")
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to launch marbletask");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())
        .expect("failed to write operator input");
    child.wait_with_output().expect("failed to wait for marbletask")
}

#[test]
fn warp_writes_default_grid_into_config_dir() {
    let root = TempDir::new().unwrap();
    let output = marbletask(root.path(), &["warp"], "");
    assert!(output.status.success(), "{output:?}");

    let asset = fs::read_to_string(root.path().join("perspective.data")).unwrap();
    let mut lines = asset.lines();
    assert_eq!(
        lines.next(),
        Some("source_x\tsource_y\tmapped_u\tmapped_v\tweight")
    );
    assert_eq!(lines.count(), 100 * 60);
}

#[test]
fn warp_honours_profile_and_output() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("bench.toml"),
        "grid_width = 4\ngrid_height = 3\n",
    )
    .unwrap();
    let target = root.path().join("out/bench.data");
    let output = marbletask(
        root.path(),
        &["warp", "--profile", "bench", "--output", target.to_str().unwrap()],
        "",
    );
    assert!(output.status.success(), "{output:?}");
    assert_eq!(fs::read_to_string(&target).unwrap().lines().count(), 13);
}

#[test]
fn missing_profile_exits_with_diagnostic() {
    let root = TempDir::new().unwrap();
    let output = marbletask(root.path(), &["--config", "absent"], "");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("absent.toml"), "stderr was: {stderr}");
}

#[test]
fn missing_warp_asset_is_fatal_unless_disabled() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("demo.toml"), MARBLE_PROFILE).unwrap();

    let output = marbletask(root.path(), &["--frames", "2"], "");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("marbletask warp"), "stderr was: {stderr}");

    let output = marbletask(root.path(), &["--perspective", "--frames", "2"], "");
    assert!(output.status.success(), "{output:?}");
}

#[test]
fn marble_task_runs_with_generated_warp() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("demo.toml"), MARBLE_PROFILE).unwrap();
    assert!(marbletask(root.path(), &["warp"], "").status.success());

    let output = marbletask(root.path(), &["--frames", "5", "--fps", "240"], "r\n");
    assert!(output.status.success(), "{output:?}");
}

#[test]
fn invalid_profile_is_rejected() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("demo.toml"), "trough_full_angle = 400\n").unwrap();
    let output = marbletask(root.path(), &["--perspective"], "");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn wedge_task_stops_on_quit() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("wedge_demo.toml"), WEDGE_PROFILE).unwrap();
    let output = marbletask(root.path(), &["wedge", "--fps", "240"], "press d\nrelease d\nq\n");
    assert!(output.status.success(), "{output:?}");
}
