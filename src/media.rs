//! On-disk storage for uploaded X-ray files.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Utc};
use thiserror::Error;
use uuid::Uuid;

pub const IMAGE_DIR: &str = "medical_images";

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Could not write media file {path}: {source}")]
    Write { path: String, source: std::io::Error },

    #[error("Could not remove media file {path}: {source}")]
    Remove { path: String, source: std::io::Error },

    #[error("Refusing media path outside the media root: {0}")]
    OutsideRoot(String),
}

/// Files live at `<root>/medical_images/YYYY/MM/DD/<uuid>.<ext>`; callers
/// only ever see the path relative to the root.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> MediaStore {
        MediaStore { root: root.into() }
    }

    /// Writes `bytes` under today's date directory and returns the relative
    /// path, always with `/` separators.
    pub fn save_image(&self, bytes: &[u8], extension: &str) -> Result<String, MediaError> {
        self.save_image_at(bytes, extension, Utc::now())
    }

    fn save_image_at(&self, bytes: &[u8], extension: &str, now: DateTime<Utc>) -> Result<String, MediaError> {
        let relative = format!(
            "{IMAGE_DIR}/{:04}/{:02}/{:02}/{}.{extension}",
            now.year(),
            now.month(),
            now.day(),
            Uuid::new_v4().simple(),
        );
        let full = self.root.join(&relative);
        let write_err = |source| MediaError::Write { path: full.display().to_string(), source };

        if let Some(dir) = full.parent() {
            std::fs::create_dir_all(dir).map_err(write_err)?;
        }
        std::fs::write(&full, bytes).map_err(write_err)?;
        tracing::debug!(path = %relative, bytes = bytes.len(), "Stored media file");
        Ok(relative)
    }

    /// Absolute location of a stored relative path.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, MediaError> {
        let rel = Path::new(relative);
        let escapes = rel.is_absolute()
            || rel.components().any(|c| matches!(c, std::path::Component::ParentDir));
        if escapes {
            return Err(MediaError::OutsideRoot(relative.to_owned()));
        }
        Ok(self.root.join(rel))
    }

    /// Deletes a stored file that no row will reference.
    pub fn remove(&self, relative: &str) -> Result<(), MediaError> {
        let path = self.resolve(relative)?;
        std::fs::remove_file(&path).map_err(|source| MediaError::Remove { path: path.display().to_string(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn saves_under_dated_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        let when = Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap();
        let rel = store.save_image_at(b"abc", "png", when).unwrap();

        assert!(rel.starts_with("medical_images/2024/03/07/"), "{rel}");
        assert!(rel.ends_with(".png"));
        assert_eq!(std::fs::read(store.resolve(&rel).unwrap()).unwrap(), b"abc");
    }

    #[test]
    fn remove_deletes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        let rel = store.save_image(b"abc", "jpg").unwrap();
        store.remove(&rel).unwrap();
        assert!(!store.resolve(&rel).unwrap().exists());
        assert!(matches!(store.remove(&rel), Err(MediaError::Remove { .. })));
    }

    #[test]
    fn names_never_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        let a = store.save_image(b"1", "jpg").unwrap();
        let b = store.save_image(b"2", "jpg").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_escaping_paths() {
        let store = MediaStore::new("/tmp/media");
        assert!(matches!(store.resolve("../etc/passwd"), Err(MediaError::OutsideRoot(_))));
        assert!(matches!(store.resolve("/etc/passwd"), Err(MediaError::OutsideRoot(_))));
    }
}
