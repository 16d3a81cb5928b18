use std::time::Duration;

use gnss_sim_core::replay::{Recording, RecordingError, ReplaySource};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::time::Instant;

const SESSION: &str = r#"{
    "0.0": {"lat": 51.590, "lon": 19.890, "quality": 4, "speed": 0.0},
    "0.2": {"lat": 51.591, "lon": 19.891, "quality": 4, "speed": 18.0},
    "0.5": {"lat": 51.592, "lon": 19.892, "quality": 5, "speed": 36.0},
    "1.5": {"lat": 51.593, "lon": 19.893, "quality": 5, "speed": 54.0}
}"#;

fn assert_near(actual: Duration, expected: Duration) {
    let diff = if actual > expected {
        actual - expected
    } else {
        expected - actual
    };
    assert!(
        diff < Duration::from_millis(2),
        "expected ~{:?}, got {:?}",
        expected,
        actual
    );
}

fn session_file() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, SESSION).unwrap();
    (dir, path)
}

#[test]
fn test_load_session_file() {
    let (_dir, path) = session_file();
    let recording = Recording::load(&path).unwrap();

    assert_eq!(recording.len(), 4);
    assert!((recording.duration_secs() - 1.5).abs() < 1e-12);
    assert_eq!(recording.get(2).unwrap().speed_kmh, 36.0);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Recording::load(dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, RecordingError::Io { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_playback_follows_recorded_timing() {
    let (_dir, path) = session_file();
    let mut source = ReplaySource::new(Recording::load(&path).unwrap());

    let start = Instant::now();
    let mut arrivals = Vec::new();
    let mut speeds = Vec::new();
    for _ in 0..3 {
        let payload = source.next().await;
        arrivals.push(start.elapsed());
        speeds.push(payload["speed"].as_f64().unwrap());
    }

    assert_near(arrivals[0], Duration::from_millis(200));
    assert_near(arrivals[1], Duration::from_millis(500));
    assert_near(arrivals[2], Duration::from_millis(1500));
    assert_eq!(speeds, vec![5.0, 10.0, 15.0]);
}

#[tokio::test(start_paused = true)]
async fn test_loop_skips_first_sample_and_waits_cooldown() {
    let (_dir, path) = session_file();
    let mut source = ReplaySource::new(Recording::load(&path).unwrap())
        .with_loop_cooldown(Duration::from_millis(250));

    for _ in 0..3 {
        source.next().await;
    }

    let start = Instant::now();
    let payload = source.next().await;
    assert_near(start.elapsed(), Duration::from_millis(450));
    assert_eq!(
        serde_json::Value::Object(payload),
        json!({"lat": 51.591, "lon": 19.891, "quality": 4, "speed": 5.0})
    );
    assert_eq!(source.loops(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_loops_do_not_rescale_speed() {
    let (_dir, path) = session_file();
    let mut source = ReplaySource::new(Recording::load(&path).unwrap())
        .with_loop_cooldown(Duration::ZERO);

    for pass in 0..5 {
        let payload = source.next().await;
        assert_eq!(payload["speed"], json!(5.0), "pass {}", pass);
        source.next().await;
        source.next().await;
    }
    assert_eq!(source.loops(), 4);
}
