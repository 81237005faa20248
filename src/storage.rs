//! Gallery file storage.
//!
//! Image files live flat under a media root. Records in the `images` table
//! reference them by filename; the handlers keep file and row lifecycles in
//! step (replacing an image deletes the superseded file, deleting a category
//! deletes every file it owned).

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    /// Open (and create if needed) the media root directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store file bytes under a unique name derived from the uploaded
    /// filename, returning the stored name.
    pub fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        if bytes.is_empty() {
            return Err(AppError::BadRequest("Empty file".into()));
        }

        let (stem, ext) = split_name(original_name);
        let token = uuid::Uuid::new_v4().simple().to_string();
        let filename = match ext {
            Some(ext) => format!("{}-{}.{}", stem, &token[..8], ext),
            None => format!("{}-{}", stem, &token[..8]),
        };

        fs::write(self.path_for(&filename)?, bytes)?;
        Ok(filename)
    }

    pub fn read(&self, filename: &str) -> Result<Vec<u8>> {
        let path = self.path_for(filename)?;
        fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::NotFound(format!("No media file {}", filename))
            } else {
                e.into()
            }
        })
    }

    /// Remove a stored file. A file that is already gone is logged, not an
    /// error - the row is the source of truth.
    pub fn delete(&self, filename: &str) -> Result<()> {
        let path = self.path_for(filename)?;
        if let Err(e) = fs::remove_file(&path) {
            if e.kind() == std::io::ErrorKind::NotFound {
                tracing::warn!("Media file {} already missing on delete", filename);
            } else {
                return Err(e.into());
            }
        }
        Ok(())
    }

    fn path_for(&self, filename: &str) -> Result<PathBuf> {
        // Stored names are flat; anything with a path separator or dot-dot
        // never came from save()
        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
        {
            return Err(AppError::BadRequest("Invalid media filename".into()));
        }
        Ok(self.root.join(filename))
    }
}

/// Split an uploaded filename into a sanitized stem and extension.
fn split_name(original: &str) -> (String, Option<String>) {
    // Browsers may send full paths; keep the last component only
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original);

    let (stem, ext) = match base.rsplit_once('.') {
        Some((s, e)) if !s.is_empty() && !e.is_empty() => (s, Some(e.to_ascii_lowercase())),
        _ => (base, None),
    };

    let mut clean = String::with_capacity(stem.len());
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            clean.push(c);
        } else {
            clean.push('_');
        }
    }
    if clean.is_empty() {
        clean.push_str("upload");
    }

    (clean, ext)
}

#[cfg(test)]
mod tests {
    use super::split_name;

    #[test]
    fn test_split_name_strips_paths() {
        let (stem, ext) = split_name("C:\\photos\\wedding shot.JPG");
        assert_eq!(stem, "wedding_shot");
        assert_eq!(ext.as_deref(), Some("jpg"));
    }

    #[test]
    fn test_split_name_no_extension() {
        let (stem, ext) = split_name("raw");
        assert_eq!(stem, "raw");
        assert!(ext.is_none());
    }
}
