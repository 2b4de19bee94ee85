use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// File extensions the image pipeline accepts.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];
/// File extensions the video pipeline accepts.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv"];

/// An upload held in memory for the duration of a single invocation.
#[derive(Debug, Clone)]
pub struct UploadedMedia {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl UploadedMedia {
    /// Read a file into memory, rejecting extensions outside `accepted`.
    pub fn from_path(path: &Path, accepted: &[&str]) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase())
            .ok_or_else(|| anyhow!("File has no extension: {}", path.display()))?;

        if !accepted.contains(&ext.as_str()) {
            return Err(anyhow!(
                "Unsupported file type '{}' (accepted: {})",
                ext,
                accepted.join(", ")
            ));
        }

        let bytes =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("upload")
            .to_string();

        let mime = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self { name, mime, bytes })
    }

    pub fn size_kb(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0
    }

    /// Lowercased extension of the declared name, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase())
    }
}

/// A uniquely named temporary copy of an upload, extension preserved so the
/// video backends can sniff the container format.
///
/// The file is removed on drop, which covers every exit path of a run.
pub struct TempMedia {
    path: PathBuf,
}

impl TempMedia {
    pub fn write(media: &UploadedMedia) -> Result<Self> {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let stem = format!("plaque-relay-{}-{:x}", std::process::id(), nanos);
        let file_name = match media.extension() {
            Some(ext) => format!("{}.{}", stem, ext),
            None => stem,
        };

        let path = std::env::temp_dir().join(file_name);
        fs::write(&path, &media.bytes)
            .with_context(|| format!("Failed to stage upload at {}", path.display()))?;

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempMedia {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(
                "Failed to remove temporary file {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(name: &str) -> UploadedMedia {
        UploadedMedia {
            name: name.to_string(),
            mime: "video/mp4".to_string(),
            bytes: vec![1, 2, 3, 4],
        }
    }

    #[test]
    fn rejects_unsupported_extension() {
        let dir = std::env::temp_dir();
        let path = dir.join("plaque_relay_test_reject.gif");
        fs::write(&path, b"gif").unwrap();
        let result = UploadedMedia::from_path(&path, IMAGE_EXTENSIONS);
        fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn accepts_uppercase_extension() {
        let dir = std::env::temp_dir();
        let path = dir.join("plaque_relay_test_upper.PNG");
        fs::write(&path, b"png").unwrap();
        let result = UploadedMedia::from_path(&path, IMAGE_EXTENSIONS);
        fs::remove_file(&path).unwrap();
        let media = result.unwrap();
        assert_eq!(media.name, "plaque_relay_test_upper.PNG");
        assert_eq!(media.mime, "image/png");
    }

    #[test]
    fn temp_media_preserves_extension_and_removes_on_drop() {
        let tmp = TempMedia::write(&media("clip.mkv")).unwrap();
        let path = tmp.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(path.extension().and_then(|s| s.to_str()), Some("mkv"));
        drop(tmp);
        assert!(!path.exists());
    }

    #[test]
    fn temp_media_removed_when_error_escapes() {
        let mut staged = PathBuf::new();
        let result: Result<()> = (|| {
            let tmp = TempMedia::write(&media("clip.mp4"))?;
            staged = tmp.path().to_path_buf();
            assert!(staged.exists());
            anyhow::bail!("injected failure mid-run")
        })();
        assert!(result.is_err());
        assert!(!staged.exists());
    }
}
