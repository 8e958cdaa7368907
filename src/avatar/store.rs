//! On-disk avatar storage.
//!
//! Each avatar is stored as `<id>.png` next to `<id>_face.json`, which holds
//! the source face rect the compositor needs when the avatar speaks later.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::Avatar;
use crate::error::{Result, SayfaceError};
use crate::face::FaceRect;

/// Face metadata written beside every avatar image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvatarMeta {
    /// `[x, y, w, h]` of the face in the source photo.
    pub face_rect: [u32; 4],
    /// `[width, height]` of the avatar canvas.
    pub image_size: [u32; 2],
    /// Avatar origin; photos processed here are always `"custom"`.
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

impl AvatarMeta {
    fn for_face(face: &FaceRect, width: u32, height: u32) -> Self {
        Self {
            face_rect: [face.x, face.y, face.w, face.h],
            image_size: [width, height],
            kind: "custom".to_owned(),
            created_at: Utc::now(),
        }
    }

    /// The stored face rect.
    pub fn face(&self) -> FaceRect {
        let [x, y, w, h] = self.face_rect;
        FaceRect::new(x, y, w, h)
    }
}

/// Paths of a stored avatar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAvatar {
    pub id: String,
    pub image_path: PathBuf,
    pub meta_path: PathBuf,
}

/// Directory-backed avatar store.
#[derive(Debug, Clone)]
pub struct AvatarStore {
    dir: PathBuf,
}

impl AvatarStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn image_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.png"))
    }

    fn meta_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}_face.json"))
    }

    /// Write an avatar under a fresh id.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or either file
    /// cannot be written.
    pub fn save(&self, avatar: &Avatar) -> Result<StoredAvatar> {
        std::fs::create_dir_all(&self.dir)?;
        let id = Uuid::new_v4().to_string();
        let image_path = self.image_path(&id);
        let meta_path = self.meta_path(&id);

        avatar
            .canvas
            .save_with_format(&image_path, image::ImageFormat::Png)
            .map_err(|e| {
                SayfaceError::Store(format!("failed to write {}: {e}", image_path.display()))
            })?;

        let (width, height) = avatar.canvas.dimensions();
        let meta = AvatarMeta::for_face(&avatar.face, width, height);
        let json = serde_json::to_string_pretty(&meta)
            .map_err(|e| SayfaceError::Store(e.to_string()))?;
        if let Err(e) = std::fs::write(&meta_path, json) {
            let _ = std::fs::remove_file(&image_path);
            return Err(e.into());
        }

        info!(%id, path = %image_path.display(), "avatar saved");
        Ok(StoredAvatar {
            id,
            image_path,
            meta_path,
        })
    }

    /// Read the metadata of a stored avatar.
    ///
    /// # Errors
    ///
    /// Returns a store error for malformed ids or metadata, and an I/O error
    /// when the file is missing.
    pub fn load_meta(&self, id: &str) -> Result<AvatarMeta> {
        validate_id(id)?;
        let content = std::fs::read_to_string(self.meta_path(id))?;
        serde_json::from_str(&content)
            .map_err(|e| SayfaceError::Store(format!("bad metadata for avatar {id}: {e}")))
    }

    /// Load a stored avatar together with its face rect.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is malformed, a file is missing, or the
    /// image does not match its metadata.
    pub fn load(&self, id: &str) -> Result<Avatar> {
        let meta = self.load_meta(id)?;
        let canvas = image::open(self.image_path(id))
            .map_err(|e| SayfaceError::Store(format!("failed to read avatar {id}: {e}")))?
            .to_rgb8();
        if canvas.dimensions() != (meta.image_size[0], meta.image_size[1]) {
            return Err(SayfaceError::Store(format!(
                "avatar {id} is {:?}, metadata says {:?}",
                canvas.dimensions(),
                meta.image_size
            )));
        }
        Ok(Avatar {
            canvas,
            face: meta.face(),
        })
    }

    /// Path of the stored PNG for `id`, if it exists.
    pub fn image_path_of(&self, id: &str) -> Option<PathBuf> {
        validate_id(id).ok()?;
        let path = self.image_path(id);
        path.is_file().then_some(path)
    }
}

/// Ids are UUIDs; anything else could escape the store directory.
fn validate_id(id: &str) -> Result<()> {
    Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| SayfaceError::Store(format!("invalid avatar id: {id:?}")))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::avatar::CANVAS_SIZE;
    use crate::raster::Color;

    fn sample_avatar() -> Avatar {
        let face = FaceRect::new(10, 20, 150, 160);
        Avatar {
            canvas: crate::avatar::render_canvas(
                &face,
                Color::new(200, 170, 140),
                Color::new(40, 30, 20),
            ),
            face,
        }
    }

    #[test]
    fn save_then_load_returns_same_avatar() {
        let dir = tempfile::tempdir().unwrap();
        let store = AvatarStore::new(dir.path());
        let avatar = sample_avatar();

        let stored = store.save(&avatar).unwrap();
        assert!(stored.image_path.is_file());
        assert!(stored.meta_path.ends_with(format!("{}_face.json", stored.id)));

        let loaded = store.load(&stored.id).unwrap();
        assert_eq!(loaded, avatar);
    }

    #[test]
    fn metadata_has_expected_shape() {
        let dir = tempfile::tempdir().unwrap();
        let store = AvatarStore::new(dir.path());
        let stored = store.save(&sample_avatar()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&stored.meta_path).unwrap()).unwrap();
        assert_eq!(raw["face_rect"], serde_json::json!([10, 20, 150, 160]));
        assert_eq!(raw["image_size"], serde_json::json!([CANVAS_SIZE, CANVAS_SIZE]));
        assert_eq!(raw["kind"], "custom");
        assert!(raw["created_at"].is_string());
    }

    #[test]
    fn ids_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let store = AvatarStore::new(dir.path());
        let avatar = sample_avatar();
        let a = store.save(&avatar).unwrap();
        let b = store.save(&avatar).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn path_like_ids_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = AvatarStore::new(dir.path());
        assert!(matches!(store.load("../etc/passwd"), Err(SayfaceError::Store(_))));
        assert!(store.image_path_of("../x").is_none());
    }

    #[test]
    fn missing_avatar_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = AvatarStore::new(dir.path());
        let id = Uuid::new_v4().to_string();
        assert!(matches!(store.load(&id), Err(SayfaceError::Io(_))));
    }
}
