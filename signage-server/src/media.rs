use crate::store::StoreError;
use axum::body::Bytes;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// URL prefix under which stored files are served.
pub const UPLOAD_PREFIX: &str = "/uploads";

const ALLOWED_MIME_PREFIXES: [&str; 2] = ["image/", "video/"];

/// A file part received from a multipart request.
#[derive(Debug, Clone)]
pub struct Upload {
    pub original_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl Upload {
    /// MIME type as declared by the client, or sniffed from the bytes when
    /// the client sent none.
    pub fn mime_type(&self) -> Option<String> {
        self.content_type
            .as_deref()
            .filter(|ct| !ct.is_empty() && *ct != "application/octet-stream")
            .map(str::to_string)
            .or_else(|| infer::get(&self.bytes).map(|t| t.mime_type().to_string()))
    }

    pub fn is_allowed(&self) -> bool {
        self.mime_type()
            .map(|mime| ALLOWED_MIME_PREFIXES.iter().any(|p| mime.starts_with(p)))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub file_name: String,
    pub url: String,
}

/// Directory of uploaded media.
#[derive(Debug, Clone)]
pub struct MediaStore {
    dir: PathBuf,
}

impl MediaStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<unix-millis>-<uuid>` with the original extension kept.
    pub fn generate_file_name(original_name: &str) -> String {
        let stem = format!(
            "{}-{}",
            chrono::Utc::now().timestamp_millis(),
            Uuid::new_v4()
        );

        match Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
        {
            Some(ext) => format!("{}.{}", stem, ext),
            None => stem,
        }
    }

    pub fn url_for(file_name: &str) -> String {
        format!("{}/{}", UPLOAD_PREFIX, file_name)
    }

    pub async fn save(&self, upload: &Upload) -> Result<StoredFile, StoreError> {
        let file_name = Self::generate_file_name(&upload.original_name);
        let path = self.dir.join(&file_name);

        tokio::fs::write(&path, &upload.bytes).await?;
        tracing::info!(
            "Stored upload '{}' as {:?} ({} bytes)",
            upload.original_name,
            path,
            upload.bytes.len()
        );

        Ok(StoredFile {
            url: Self::url_for(&file_name),
            file_name,
        })
    }

    /// Removes a stored file. Failures are logged and otherwise ignored.
    pub async fn remove(&self, file_name: &str) {
        // Records only ever carry bare names; never follow a path out of the directory.
        let Some(bare) = Path::new(file_name).file_name() else {
            return;
        };
        let path = self.dir.join(bare);

        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!("Failed to remove stored file {:?}: {}", path, e);
        } else {
            tracing::info!("Removed stored file {:?}", path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Smallest valid PNG header, enough for sniffing.
    const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    fn upload(name: &str, content_type: Option<&str>, bytes: &[u8]) -> Upload {
        Upload {
            original_name: name.to_string(),
            content_type: content_type.map(str::to_string),
            bytes: Bytes::copy_from_slice(bytes),
        }
    }

    #[test]
    fn test_generated_names_keep_extension() {
        let a = MediaStore::generate_file_name("holiday.photo.JPG");
        let b = MediaStore::generate_file_name("holiday.photo.JPG");
        assert!(a.ends_with(".JPG"));
        assert_ne!(a, b);

        let bare = MediaStore::generate_file_name("README");
        assert!(!bare.contains('.'));
    }

    #[test]
    fn test_mime_allow_list() {
        assert!(upload("a.png", Some("image/png"), b"x").is_allowed());
        assert!(upload("a.mp4", Some("video/mp4"), b"x").is_allowed());
        assert!(!upload("a.pdf", Some("application/pdf"), b"x").is_allowed());
        assert!(!upload("a.txt", None, b"plain text").is_allowed());

        // Sniffed when the client sent nothing useful.
        assert!(upload("a.bin", None, PNG_MAGIC).is_allowed());
        assert!(upload("a.bin", Some("application/octet-stream"), PNG_MAGIC).is_allowed());
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let media = MediaStore::open(dir.path().join("uploads")).await.unwrap();

        let stored = media
            .save(&upload("logo.png", Some("image/png"), PNG_MAGIC))
            .await
            .unwrap();
        assert!(stored.url.starts_with("/uploads/"));
        assert!(stored.url.ends_with(&stored.file_name));

        let path = media.dir().join(&stored.file_name);
        assert_eq!(std::fs::read(&path).unwrap(), PNG_MAGIC);

        media.remove(&stored.file_name).await;
        assert!(!path.exists());

        // Second removal is a logged no-op.
        media.remove(&stored.file_name).await;
    }

    #[tokio::test]
    async fn test_remove_stays_inside_directory() {
        let dir = tempfile::tempdir().unwrap();
        let outside = dir.path().join("keep.txt");
        std::fs::write(&outside, b"keep").unwrap();

        let media = MediaStore::open(dir.path().join("uploads")).await.unwrap();
        media.remove("../keep.txt").await;

        assert!(outside.exists());
    }
}
