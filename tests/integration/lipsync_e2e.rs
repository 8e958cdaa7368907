//! Photo + speech → lip-sync video through the full pipeline.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use sayface::progress::Stage;
use sayface::video::OutputFormat;
use sayface::{Capabilities, Pipeline, ProgressEvent, SayfaceError};
use tokio_util::sync::CancellationToken;

use crate::helpers::{
    dir_entries, encode_png, portrait, sine, sine_peak_for_dbfs, temp_config, write_wav,
};

/// Two seconds alternating between loud speech and pauses.
fn speech(path: &std::path::Path) {
    let mut samples = Vec::new();
    for i in 0..4 {
        let level = if i % 2 == 0 { -12.0 } else { -60.0 };
        samples.extend(sine(500, sine_peak_for_dbfs(level)));
    }
    write_wav(path, &samples);
}

#[test]
fn two_seconds_of_speech_is_forty_frames_at_twenty_fps() {
    let dir = tempfile::tempdir().unwrap();
    let config = temp_config(dir.path());
    let pipeline = Pipeline::new(config.clone()).unwrap();
    let created = pipeline.create_avatar(&encode_png(&portrait())).unwrap();

    let audio_path = dir.path().join("speech.wav");
    speech(&audio_path);
    let outcome = pipeline
        .speak(&created.stored.id, &audio_path, &CancellationToken::new())
        .unwrap();

    assert_eq!(outcome.provider, Some("procedural"));
    assert!(outcome.error.is_none());
    let video = outcome.video.expect("video should be produced");
    assert_eq!(video.frame_count, 40);
    assert_eq!(video.fps, 20);
    assert_eq!((video.width, video.height), (512, 512));
    assert_eq!(video.duration(), Duration::from_secs(2));
    assert_eq!(video.format, OutputFormat::Y4m);
    assert!(video.path.starts_with(&config.storage.video_dir));

    let bytes = std::fs::read(&video.path).unwrap();
    assert!(bytes.starts_with(b"YUV4MPEG2 W512 H512 F20:1"));
    assert_eq!(dir_entries(&config.storage.video_dir), vec![video.path.clone()]);
}

#[test]
fn progress_reports_provider_and_every_frame() {
    let dir = tempfile::tempdir().unwrap();
    let events: Arc<Mutex<Vec<ProgressEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let pipeline = Pipeline::new(temp_config(dir.path()))
        .unwrap()
        .with_progress(Box::new(move |event| {
            sink.lock().unwrap().push(event);
        }));

    let created = pipeline.create_avatar(&encode_png(&portrait())).unwrap();
    let audio_path = dir.path().join("speech.wav");
    speech(&audio_path);
    pipeline
        .speak(&created.stored.id, &audio_path, &CancellationToken::new())
        .unwrap();

    let events = events.lock().unwrap();
    assert!(events.contains(&ProgressEvent::StageStarted {
        stage: Stage::DetectFace
    }));
    assert!(events.contains(&ProgressEvent::ProviderSelected { name: "procedural" }));
    let frames: Vec<u64> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::FrameEncoded { frame, total: 40 } => Some(*frame),
            _ => None,
        })
        .collect();
    assert_eq!(frames, (1..=40).collect::<Vec<_>>());
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, ProgressEvent::Error { .. }))
    );
}

#[test]
fn undecodable_audio_degrades_to_audio_only() {
    let dir = tempfile::tempdir().unwrap();
    let config = temp_config(dir.path());
    let pipeline = Pipeline::new(config.clone()).unwrap();
    let created = pipeline.create_avatar(&encode_png(&portrait())).unwrap();

    let audio_path = dir.path().join("broken.mp3");
    std::fs::write(&audio_path, b"definitely not audio").unwrap();
    let outcome = pipeline
        .speak(&created.stored.id, &audio_path, &CancellationToken::new())
        .unwrap();

    assert!(outcome.video.is_none());
    assert!(outcome.provider.is_none());
    assert!(outcome.error.is_some());
    assert!(dir_entries(&config.storage.video_dir).is_empty());
}

#[test]
fn cancelled_request_leaves_no_video() {
    let dir = tempfile::tempdir().unwrap();
    let config = temp_config(dir.path());
    let pipeline = Pipeline::new(config.clone()).unwrap();
    let created = pipeline.create_avatar(&encode_png(&portrait())).unwrap();
    let audio_path = dir.path().join("speech.wav");
    speech(&audio_path);

    let token = CancellationToken::new();
    token.cancel();
    let err = pipeline
        .speak(&created.stored.id, &audio_path, &token)
        .unwrap_err();
    assert!(matches!(err, SayfaceError::Cancelled));
    assert!(dir_entries(&config.storage.video_dir).is_empty());
}

#[test]
fn unknown_avatar_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(temp_config(dir.path())).unwrap();
    let audio_path = dir.path().join("speech.wav");
    speech(&audio_path);
    assert!(
        pipeline
            .speak("not-an-id", &audio_path, &CancellationToken::new())
            .is_err()
    );
}

#[test]
fn capabilities_without_neural_tool() {
    let dir = tempfile::tempdir().unwrap();
    let caps = Capabilities::detect(&temp_config(dir.path()));
    assert!(caps.custom_avatars);
    assert!(caps.procedural_lipsync);
    assert!(!caps.neural_lipsync);
}
