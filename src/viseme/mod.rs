//! Viseme mapping for lip-sync animation.
//!
//! A viseme here is one of four mouth-openness levels. Each envelope window
//! maps to a level by loudness alone, so the mouth opens wider as the speaker
//! gets louder.

use serde::{Deserialize, Serialize};

use crate::audio::EnvelopeFrame;

/// Mouth openness, ordered from closed to wide open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisemeState {
    /// Silence or near-silence (lips together)
    Closed,
    /// Quiet speech (slightly parted)
    Half,
    /// Normal speech
    Open,
    /// Loud speech (mouth open wide)
    WideOpen,
}

/// Lower loudness bounds (exclusive) for the open states, loudest first.
const THRESHOLDS_DBFS: [(f64, VisemeState); 3] = [
    (-15.0, VisemeState::WideOpen),
    (-25.0, VisemeState::Open),
    (-35.0, VisemeState::Half),
];

/// Mouth state for a window loudness in dBFS.
///
/// Anything at or below -35 dBFS is closed, including `-inf` and NaN.
pub fn viseme_for_loudness(dbfs: f64) -> VisemeState {
    THRESHOLDS_DBFS
        .iter()
        .find(|(bound, _)| dbfs > *bound)
        .map_or(VisemeState::Closed, |&(_, state)| state)
}

/// Map every envelope window to a mouth state, preserving order.
pub fn map_envelope(envelope: &[EnvelopeFrame]) -> Vec<VisemeState> {
    envelope
        .iter()
        .map(|f| viseme_for_loudness(f.loudness_dbfs))
        .collect()
}
