//! Built-in frontal face and eye cascades.
//!
//! These are coarse geometric templates rather than trained classifiers:
//! every stage holds a single stump, so a window must satisfy each contrast
//! rule in turn. They expect an upright face filling the window with two
//! dark eye regions on a brighter skin band. Trained cascades can be loaded
//! from JSON instead (see [`super::cascade::Cascade::from_json_file`]).

use super::cascade::{Cascade, HaarRect, Stage, WeakClassifier};

fn rule(threshold: f32, rects: Vec<HaarRect>) -> Stage {
    Stage {
        classifiers: vec![WeakClassifier::at_least(threshold, rects)],
        threshold: 1.0,
    }
}

fn brighter(bright: HaarRect, dark: HaarRect) -> Vec<HaarRect> {
    vec![
        HaarRect { weight: 1.0, ..bright },
        HaarRect { weight: -1.0, ..dark },
    ]
}

/// Frontal face template on a 24×24 base window.
pub fn frontal_face() -> Cascade {
    let left_eye = HaarRect::new(0.20, 0.30, 0.20, 0.12, 0.0);
    let right_eye = HaarRect::new(0.60, 0.30, 0.20, 0.12, 0.0);
    let bridge = HaarRect::new(0.42, 0.30, 0.16, 0.12, 0.0);
    let left_cheek = HaarRect::new(0.20, 0.48, 0.20, 0.14, 0.0);
    let right_cheek = HaarRect::new(0.60, 0.48, 0.20, 0.14, 0.0);
    let left_temple = HaarRect::new(0.06, 0.30, 0.12, 0.12, 0.0);
    let right_temple = HaarRect::new(0.82, 0.30, 0.12, 0.12, 0.0);
    let left_edge = HaarRect::new(0.02, 0.30, 0.08, 0.32, 0.0);
    let right_edge = HaarRect::new(0.90, 0.30, 0.08, 0.32, 0.0);

    Cascade {
        name: "builtin-frontal-face".into(),
        window_width: 24,
        window_height: 24,
        stages: vec![
            // Eyes darker than the bridge of the nose.
            rule(1.5, brighter(bridge.clone(), left_eye.clone())),
            rule(1.5, brighter(bridge.clone(), right_eye.clone())),
            // Eyes darker than the cheeks below them.
            rule(1.5, brighter(left_cheek, left_eye)),
            rule(1.5, brighter(right_cheek, right_eye)),
            // Temples stay close to skin level: rejects windows smaller than the face.
            rule(-0.8, brighter(left_temple, bridge.clone())),
            rule(-0.8, brighter(right_temple, bridge.clone())),
            // Side edges stay on the face: rejects windows spilling onto the background.
            rule(-1.2, brighter(left_edge, bridge.clone())),
            rule(-1.2, brighter(right_edge, bridge)),
        ],
    }
}

/// Single-eye template on a 30×20 base window.
pub fn eye() -> Cascade {
    let center = HaarRect::new(0.30, 0.35, 0.40, 0.30, 0.0);
    let top = HaarRect::new(0.20, 0.00, 0.60, 0.15, 0.0);
    let bottom = HaarRect::new(0.20, 0.85, 0.60, 0.15, 0.0);
    let left = HaarRect::new(0.00, 0.35, 0.12, 0.30, 0.0);
    let right = HaarRect::new(0.88, 0.35, 0.12, 0.30, 0.0);

    Cascade {
        name: "builtin-eye".into(),
        window_width: 30,
        window_height: 20,
        stages: vec![
            rule(0.7, brighter(top, center.clone())),
            rule(0.7, brighter(bottom, center.clone())),
            rule(0.5, brighter(left, center.clone())),
            rule(0.5, brighter(right, center)),
        ],
    }
}
