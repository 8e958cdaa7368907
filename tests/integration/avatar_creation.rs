//! Photo → detected face → stored cartoon avatar.

use image::{Rgb, RgbImage};
use sayface::avatar::CANVAS_SIZE;
use sayface::avatar::store::AvatarStore;
use sayface::color::sample_skin_tone;
use sayface::{Pipeline, SayfaceError, detect_face};

use crate::helpers::{dir_entries, encode_png, near, portrait, portrait_at, temp_config};

#[test]
fn synthetic_portrait_face_is_found_near_the_skin_block() {
    let features = detect_face(&portrait()).expect("face should be detected");
    let face = features.face;
    assert!(near(face.x, 100, 10.0), "x = {}", face.x);
    assert!(near(face.y, 80, 10.0), "y = {}", face.y);
    assert!(near(face.w, 200, 10.0), "w = {}", face.w);
    assert!(near(face.h, 200, 10.0), "h = {}", face.h);
    assert_eq!(features.eyes.len(), 2, "eyes = {:?}", features.eyes);
    for eye in &features.eyes {
        assert!(eye.x >= face.x && eye.y >= face.y);
        assert!(eye.x + eye.w <= face.x + face.w);
        assert!(eye.y + eye.h <= face.y + face.h);
    }
}

#[test]
fn faces_against_the_image_border_stay_inside_it() {
    for (ox, oy) in [(0, 0), (200, 200), (200, 0)] {
        let features = detect_face(&portrait_at(ox, oy))
            .unwrap_or_else(|| panic!("no face with the block at ({ox}, {oy})"));
        let face = features.face;
        assert!(face.fits_within(400, 400), "({ox}, {oy}) gave {face:?}");
        assert!(face.x.abs_diff(ox) <= 10, "({ox}, {oy}) gave {face:?}");
        assert!(face.y.abs_diff(oy) <= 10, "({ox}, {oy}) gave {face:?}");
        assert_eq!(features.eyes.len(), 2, "({ox}, {oy}) gave {:?}", features.eyes);
        for eye in &features.eyes {
            assert!(eye.fits_within(400, 400), "({ox}, {oy}) eye {eye:?}");
        }
    }
}

#[test]
fn create_avatar_stores_png_and_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let config = temp_config(dir.path());
    let pipeline = Pipeline::new(config.clone()).unwrap();

    let created = pipeline.create_avatar(&encode_png(&portrait())).unwrap();
    assert_eq!(
        created.avatar.canvas.dimensions(),
        (CANVAS_SIZE, CANVAS_SIZE)
    );
    assert_eq!(created.avatar.face, created.features.face);
    assert!(created.stored.image_path.is_file());
    assert!(created.stored.meta_path.is_file());

    let store = AvatarStore::new(&config.storage.avatar_dir);
    let meta = store.load_meta(&created.stored.id).unwrap();
    assert_eq!(meta.kind, "custom");
    assert_eq!(meta.image_size, [CANVAS_SIZE, CANVAS_SIZE]);
    assert_eq!(meta.face(), created.features.face);

    let loaded = store.load(&created.stored.id).unwrap();
    assert_eq!(loaded, created.avatar);
}

#[test]
fn avatar_background_and_skin_come_from_render() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(temp_config(dir.path())).unwrap();
    let created = pipeline.create_avatar(&encode_png(&portrait())).unwrap();
    let canvas = &created.avatar.canvas;

    assert_eq!(*canvas.get_pixel(5, 5), Rgb([173, 216, 230]));
    let skin = sample_skin_tone(&portrait(), &created.features.face);
    assert_eq!(*canvas.get_pixel(150, 380), skin.to_rgb());
    // The sample square takes in part of the eye bars, pulling it darker.
    let [r, g, b] = canvas.get_pixel(150, 380).0;
    assert!(r <= 220 && g <= 190 && b <= 160);
    assert!(r > 150);
}

#[test]
fn uniform_image_is_rejected_without_writing_anything() {
    let dir = tempfile::tempdir().unwrap();
    let config = temp_config(dir.path());
    let pipeline = Pipeline::new(config.clone()).unwrap();
    let blank = RgbImage::from_pixel(300, 300, Rgb([128, 128, 128]));

    let err = pipeline.create_avatar(&encode_png(&blank)).unwrap_err();
    assert!(matches!(err, SayfaceError::FaceNotDetected));
    assert!(dir_entries(&config.storage.avatar_dir).is_empty());
}

#[test]
fn non_image_upload_is_invalid_image_data() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(temp_config(dir.path())).unwrap();
    let err = pipeline.create_avatar(b"GIF89a but not really").unwrap_err();
    assert!(matches!(err, SayfaceError::InvalidImageData(_)));
}

#[test]
fn unknown_or_malformed_ids_do_not_load() {
    let dir = tempfile::tempdir().unwrap();
    let store = AvatarStore::new(dir.path());
    assert!(matches!(
        store.load("../../etc/passwd"),
        Err(SayfaceError::Store(_))
    ));
    assert!(store.load("6f1c1a8e-9a52-4c1e-8d7e-0c3f2e9b5a11").is_err());
    assert!(store.image_path_of("not-a-uuid").is_none());
}
