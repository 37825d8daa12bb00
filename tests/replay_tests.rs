// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for recorded batch replay

use scanner::backends::{BackendError, ReplaySource};
use scanner::{PipelineController, ScanMode};
use scanner::pipeline::SurfaceSize;
use std::path::PathBuf;
use std::time::{Duration, Instant};

const RECORDING: &str = r#"[{"symbology":"ean13","payload":"4006381333931","bounding_box":{"x":0.25,"y":0.5,"width":0.5,"height":0.125}}]

[{"symbology":"qr","payload":"ABC","bounding_box":{"x":0.25,"y":0.25,"width":0.5,"height":0.5}}]
[{"symbology":"code128","payload":"4006381333931"},{"symbology":"code128","payload":"CODE-128"}]
"#;

fn write_recording(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("scanner-replay-{}-{}", name, uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("session.jsonl");
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_recording_replayed_through_pipeline() {
    let path = write_recording("pipeline", RECORDING);
    let source = ReplaySource::from_file(&path, Duration::from_millis(1)).unwrap();
    assert_eq!(source.frame_count(), 4);

    let mut controller = PipelineController::new(ScanMode::Barcode, SurfaceSize::new(300.0, 600.0));
    controller.start(Box::new(source)).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while controller.source_running() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }

    assert_eq!(
        controller.finish().unwrap(),
        vec!["4006381333931", "CODE-128"]
    );

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn test_missing_recording() {
    let result = ReplaySource::from_file(
        &std::env::temp_dir().join("scanner-no-such-recording.jsonl"),
        Duration::from_millis(1),
    );
    assert!(matches!(result, Err(BackendError::NotFound(_))));
}

#[test]
fn test_malformed_recording_names_line() {
    let path = write_recording("malformed", "[]\n[{\"symbology\":\n");
    match ReplaySource::from_file(&path, Duration::from_millis(1)) {
        Err(BackendError::InvalidData(message)) => assert!(message.contains("line 2")),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("malformed recording accepted"),
    }

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}
