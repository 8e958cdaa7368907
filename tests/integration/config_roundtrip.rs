//! TOML config persistence.

use sayface::SayfaceConfig;
use sayface::config::VideoContainer;

use crate::helpers::temp_config;

#[test]
fn saved_config_loads_back_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let mut config = temp_config(dir.path());
    config.video.fps = 25;
    config.envelope.frame_duration_ms = 40;
    config.neural.timeout_secs = 90;

    config.save_to_file(&path).unwrap();
    let loaded = SayfaceConfig::from_file(&path).unwrap();

    assert_eq!(loaded.video.fps, 25);
    assert_eq!(loaded.video.container, VideoContainer::Y4m);
    assert_eq!(loaded.envelope.frame_duration_ms, 40);
    assert!(!loaded.neural.enabled);
    assert_eq!(loaded.neural.timeout_secs, 90);
    assert_eq!(loaded.storage.avatar_dir, config.storage.avatar_dir);
    assert_eq!(loaded.storage.video_dir, config.storage.video_dir);
}

#[test]
fn partial_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[video]\ncontainer = \"mp4\"\n").unwrap();

    let loaded = SayfaceConfig::from_file(&path).unwrap();
    assert_eq!(loaded.video.container, VideoContainer::Mp4);
    assert_eq!(loaded.video.fps, 20);
    assert_eq!(loaded.envelope.frame_duration_ms, 50);
    assert_eq!(loaded.detector.face_min_neighbors, 5);
}

#[test]
fn zero_frame_rate_is_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[video]\nfps = 0\n").unwrap();
    assert!(SayfaceConfig::from_file(&path).is_err());
}
