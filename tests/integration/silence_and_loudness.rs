//! Decoded audio → loudness envelope → mouth states.

use image::{Rgb, RgbImage};
use sayface::audio::DEFAULT_FRAME_DURATION_MS;
use sayface::compositor::{MouthShape, composite_frame};
use sayface::viseme::map_envelope;
use sayface::{Avatar, FaceRect, VisemeState, analyze_envelope, decode_audio};

use crate::helpers::{sine, sine_peak_for_dbfs, write_wav};

#[test]
fn one_second_of_silence_is_twenty_closed_frames() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("silence.wav");
    write_wav(&path, &vec![0.0; 16_000]);

    let audio = decode_audio(&path).unwrap();
    assert_eq!(audio.duration_ms(), 1000);
    let envelope = analyze_envelope(&audio, DEFAULT_FRAME_DURATION_MS).unwrap();
    assert_eq!(envelope.len(), 20);
    assert!(envelope.iter().all(|f| f.loudness_dbfs == f64::NEG_INFINITY));
    assert_eq!(envelope[19].offset_ms, 950);

    let states = map_envelope(&envelope);
    assert_eq!(states, vec![VisemeState::Closed; 20]);
}

#[test]
fn loud_tone_opens_the_mouth_wide() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    write_wav(&path, &sine(500, sine_peak_for_dbfs(-12.0)));

    let audio = decode_audio(&path).unwrap();
    let envelope = analyze_envelope(&audio, DEFAULT_FRAME_DURATION_MS).unwrap();
    assert_eq!(envelope.len(), 10);
    for frame in &envelope {
        assert!(
            (frame.loudness_dbfs + 12.0).abs() < 0.5,
            "window at {} ms measured {} dBFS",
            frame.offset_ms,
            frame.loudness_dbfs
        );
    }
    let states = map_envelope(&envelope);
    assert!(states.iter().all(|&s| s == VisemeState::WideOpen));

    let face = FaceRect::new(100, 80, 200, 200);
    let shape = MouthShape::for_state(&face, VisemeState::WideOpen);
    assert_eq!(shape.half_height, (200.0f32 * 0.22).round());
}

#[test]
fn quieter_tones_map_to_smaller_mouths() {
    let dir = tempfile::tempdir().unwrap();
    let cases = [
        (-20.0, VisemeState::Open),
        (-30.0, VisemeState::Half),
        (-45.0, VisemeState::Closed),
    ];
    for (level, expected) in cases {
        let path = dir.path().join(format!("tone{level}.wav"));
        write_wav(&path, &sine(200, sine_peak_for_dbfs(level)));
        let audio = decode_audio(&path).unwrap();
        let envelope = analyze_envelope(&audio, DEFAULT_FRAME_DURATION_MS).unwrap();
        let states = map_envelope(&envelope);
        assert_eq!(states.len(), 4);
        assert!(
            states.iter().all(|&s| s == expected),
            "{level} dBFS gave {states:?}"
        );
    }
}

#[test]
fn wide_open_frame_differs_from_closed_only_around_the_mouth() {
    let face = FaceRect::new(100, 80, 200, 200);
    let avatar = Avatar {
        canvas: RgbImage::from_pixel(512, 512, Rgb([200, 200, 200])),
        face,
    };
    let closed = composite_frame(&avatar, VisemeState::Closed);
    let wide = composite_frame(&avatar, VisemeState::WideOpen);
    assert_eq!(closed.dimensions(), wide.dimensions());
    assert_ne!(closed, wide);
    assert_eq!(closed.get_pixel(20, 20), wide.get_pixel(20, 20));
    assert_eq!(closed.get_pixel(200, 400), wide.get_pixel(200, 400));
}
