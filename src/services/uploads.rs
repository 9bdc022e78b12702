//! uploads.rs
//!
//! Upload handler: validates media type and size, writes files into the
//! uploads directory under generated names and hands out public URLs.
//!
//! The service also keeps the registry of every file it issued. That registry
//! is the only authority on whether a URL found on an event refers to
//! locally hosted media ([`UploadService::resolve`]).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::UploadsConfig;
use crate::error::AppError;
use crate::models::{MediaRef, StoredFile};

pub const UPLOADS_ROUTE: &str = "/uploads/";

const IMAGE_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];
const VIDEO_MIME_TYPES: &[&str] = &["video/mp4", "video/webm", "video/ogg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn allowed_mime_types(self) -> &'static [&'static str] {
        match self {
            MediaKind::Image => IMAGE_MIME_TYPES,
            MediaKind::Video => VIDEO_MIME_TYPES,
        }
    }

    fn type_error(self) -> &'static str {
        match self {
            MediaKind::Image => "Invalid file type. Only JPEG, PNG, GIF, and WebP are allowed.",
            MediaKind::Video => "Invalid file type. Only MP4, WebM, and OGG are allowed.",
        }
    }
}

// Response body of POST /uploads/{image,video}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub filename: String,
    pub url: String,
    pub mimetype: String,
    pub size: u64,
}

pub struct UploadService {
    config: UploadsConfig,
    issued: RwLock<HashSet<String>>,
}

impl UploadService {
    pub fn new(config: UploadsConfig) -> Self {
        Self {
            config,
            issued: RwLock::new(HashSet::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    pub fn max_bytes(&self, kind: MediaKind) -> u64 {
        match kind {
            MediaKind::Image => self.config.max_image_bytes,
            MediaKind::Video => self.config.max_video_bytes,
        }
    }

    /// Empties the uploads directory, or creates it when missing.
    /// Nothing uploaded before a restart survives it.
    pub async fn reset_storage(&self) -> Result<(), AppError> {
        let dir = self.dir();
        match fs::read_dir(dir).await {
            Ok(mut entries) => {
                let mut removed = 0usize;
                while let Some(entry) = entries.next_entry().await? {
                    let path = entry.path();
                    if entry.file_type().await?.is_dir() {
                        fs::remove_dir_all(&path).await?;
                    } else {
                        fs::remove_file(&path).await?;
                    }
                    removed += 1;
                }
                info!(dir = %dir.display(), removed, "Cleaned uploads directory");
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fs::create_dir_all(dir).await?;
                info!(dir = %dir.display(), "Created uploads directory");
            }
            Err(e) => return Err(e.into()),
        }

        self.issued.write().await.clear();
        Ok(())
    }

    pub fn check_mime(&self, kind: MediaKind, mimetype: Option<&str>) -> Result<String, AppError> {
        match mimetype {
            Some(m) if kind.allowed_mime_types().contains(&m) => Ok(m.to_string()),
            _ => Err(AppError::UnsupportedMediaType(kind.type_error().to_string())),
        }
    }

    pub fn check_size(&self, kind: MediaKind, size: u64) -> Result<(), AppError> {
        let limit = self.max_bytes(kind);
        if size > limit {
            return Err(AppError::PayloadTooLarge {
                limit_mb: limit / (1024 * 1024),
            });
        }
        Ok(())
    }

    /// Validates and persists one uploaded file.
    pub async fn store(
        &self,
        kind: MediaKind,
        original_name: Option<&str>,
        mimetype: Option<&str>,
        bytes: &[u8],
    ) -> Result<UploadedFile, AppError> {
        let mimetype = self.check_mime(kind, mimetype)?;
        self.check_size(kind, bytes.len() as u64)?;

        let filename = format!("{}{}", Uuid::new_v4(), extension_of(original_name));
        fs::write(self.config.dir.join(&filename), bytes).await?;
        self.issued.write().await.insert(filename.clone());

        debug!(filename = %filename, size = bytes.len(), "Stored upload");

        Ok(UploadedFile {
            url: self.url_for(&filename),
            filename,
            mimetype,
            size: bytes.len() as u64,
        })
    }

    pub fn url_for(&self, filename: &str) -> String {
        format!("{}{}{}", self.config.public_url, UPLOADS_ROUTE, filename)
    }

    /// Classifies a client-supplied URL. Only files this service issued and
    /// still holds come back tagged as locally owned.
    pub async fn resolve(&self, url: &str) -> MediaRef {
        let prefix = format!("{}{}", self.config.public_url, UPLOADS_ROUTE);
        if let Some(filename) = url.strip_prefix(&prefix) {
            if self.issued.read().await.contains(filename) {
                return MediaRef::local(url, StoredFile::new(filename));
            }
        }
        MediaRef::external(url)
    }

    /// Removes a stored file. A file that is already gone yields `Ok(false)`.
    pub async fn delete(&self, file: &StoredFile) -> std::io::Result<bool> {
        let Some(path) = self.path_for(file.filename()) else {
            return Ok(false);
        };

        let result = match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        };
        if result.is_ok() {
            self.issued.write().await.remove(file.filename());
        }
        result
    }

    /// Reads a stored file for serving. Unknown or malformed names are
    /// reported as a bad request, matching the public API.
    pub async fn read(&self, filename: &str) -> Result<(Vec<u8>, &'static str), AppError> {
        let path = self
            .path_for(filename)
            .ok_or_else(|| AppError::Validation("File not found".to_string()))?;

        match fs::read(&path).await {
            Ok(bytes) => Ok((bytes, content_type_for(filename))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(AppError::Validation("File not found".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn path_for(&self, filename: &str) -> Option<PathBuf> {
        let is_plain = !filename.is_empty()
            && filename != "."
            && filename != ".."
            && !filename.contains(['/', '\\'])
            && !filename.contains("..");
        is_plain.then(|| self.config.dir.join(filename))
    }
}

/// `.ext` of the client's filename, or an empty string.
fn extension_of(original_name: Option<&str>) -> String {
    original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

fn content_type_for(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "ogg" | "ogv" => "video/ogg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(dir: &Path) -> UploadService {
        UploadService::new(UploadsConfig::with_dir(dir))
    }

    #[tokio::test]
    async fn stores_image_under_generated_name() {
        let tmp = tempfile::tempdir().unwrap();
        let uploads = service(tmp.path());

        let uploaded = uploads
            .store(MediaKind::Image, Some("Holiday.PNG"), Some("image/png"), b"png-bytes")
            .await
            .unwrap();

        assert!(uploaded.filename.ends_with(".png"));
        assert_ne!(uploaded.filename, "Holiday.PNG");
        assert_eq!(
            uploaded.url,
            format!("http://localhost:3000/uploads/{}", uploaded.filename)
        );
        assert_eq!(uploaded.mimetype, "image/png");
        assert_eq!(uploaded.size, 9);
        assert_eq!(
            std::fs::read(tmp.path().join(&uploaded.filename)).unwrap(),
            b"png-bytes"
        );
    }

    #[tokio::test]
    async fn rejects_wrong_mime_type_before_writing() {
        let tmp = tempfile::tempdir().unwrap();
        let uploads = service(tmp.path());

        let err = uploads
            .store(MediaKind::Video, Some("a.png"), Some("image/png"), b"x")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnsupportedMediaType(_)));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn rejects_oversized_image_before_writing() {
        let tmp = tempfile::tempdir().unwrap();
        let uploads = service(tmp.path());
        let six_mb = vec![0u8; 6 * 1024 * 1024];

        let err = uploads
            .store(MediaKind::Image, Some("big.jpg"), Some("image/jpeg"), &six_mb)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge { limit_mb: 5 }));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn video_cap_is_twenty_megabytes() {
        let tmp = tempfile::tempdir().unwrap();
        let uploads = service(tmp.path());

        let at_limit = vec![0u8; 20 * 1024 * 1024];
        let stored = uploads
            .store(MediaKind::Video, Some("clip.webm"), Some("video/webm"), &at_limit)
            .await
            .unwrap();
        assert_eq!(stored.size, 20 * 1024 * 1024);
        std::fs::remove_file(tmp.path().join(&stored.filename)).unwrap();

        let over_limit = vec![0u8; 20 * 1024 * 1024 + 1];
        let err = uploads
            .store(MediaKind::Video, Some("long.mp4"), Some("video/mp4"), &over_limit)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge { limit_mb: 20 }));
        assert_eq!(err.to_string(), "File too large. Maximum size is 20MB");
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn resolve_only_tags_issued_files_as_local() {
        let tmp = tempfile::tempdir().unwrap();
        let uploads = service(tmp.path());
        let uploaded = uploads
            .store(MediaKind::Image, Some("a.gif"), Some("image/gif"), b"gif")
            .await
            .unwrap();

        let local = uploads.resolve(&uploaded.url).await;
        assert_eq!(local.local_file().map(|f| f.filename()), Some(uploaded.filename.as_str()));

        let forged = uploads
            .resolve("http://localhost:3000/uploads/not-ours.png")
            .await;
        assert!(!forged.is_local());

        let youtube = uploads.resolve("https://youtu.be/dQw4w9WgXcQ").await;
        assert!(!youtube.is_local());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let uploads = service(tmp.path());
        let uploaded = uploads
            .store(MediaKind::Video, Some("clip.mp4"), Some("video/mp4"), b"mp4")
            .await
            .unwrap();
        let file = StoredFile::new(uploaded.filename.clone());

        assert!(uploads.delete(&file).await.unwrap());
        assert!(!uploads.delete(&file).await.unwrap());
        assert!(!uploads.resolve(&uploaded.url).await.is_local());
    }

    #[tokio::test]
    async fn read_rejects_traversal_and_missing_files() {
        let tmp = tempfile::tempdir().unwrap();
        let uploads = service(tmp.path());

        assert!(matches!(
            uploads.read("../Cargo.toml").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            uploads.read("missing.png").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn reset_storage_wipes_existing_files() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("uploads");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("stale.png"), b"old").unwrap();

        let uploads = service(&dir);
        uploads.reset_storage().await.unwrap();
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);

        let fresh = tmp.path().join("fresh");
        service(&fresh).reset_storage().await.unwrap();
        assert!(fresh.is_dir());
    }

    #[test]
    fn extension_is_preserved_and_normalized() {
        assert_eq!(extension_of(Some("photo.JPG")), ".jpg");
        assert_eq!(extension_of(Some("archive.tar.gz")), ".gz");
        assert_eq!(extension_of(Some("noext")), "");
        assert_eq!(extension_of(None), "");
    }
}
