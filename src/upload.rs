//! Asset uploads
//!
//! Upload-then-link: a file is stored first, and only the public URL that
//! comes back is ever written to a record. A failed upload writes nothing.
//!
//! Object naming:
//! - catalog assets: `<kind-prefix>/<random>.<ext>` in the asset bucket
//! - site assets: `logo-<random>.<ext>` / `banner-<random>.<ext>` in the site bucket

use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use crate::api::{BlobStore, CatalogStore, StoreError};
use crate::cache::{CacheError, ContentCache};
use crate::models::{Banner, BannerDraft, SITE_LOGO_KEY};

pub const DEFAULT_ASSET_BUCKET: &str = "assets";
pub const DEFAULT_SITE_BUCKET: &str = "site-assets";

/// Upload errors
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("File is empty: {0}")]
    EmptyFile(String),

    #[error("Upload failed: {0}")]
    Store(#[from] StoreError),

    #[error("Uploaded, but saving the reference failed: {0}")]
    Link(#[from] CacheError),
}

/// What an uploaded file is for; decides bucket and object name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    CategoryIcon,
    CollectionImage,
    MeditationImage,
    EpisodeMedia,
    MiracleImage,
    MiracleAudio,
    Logo,
    Banner,
}

impl AssetKind {
    /// Site-wide assets live in the site bucket
    pub fn is_site_asset(&self) -> bool {
        matches!(self, AssetKind::Logo | AssetKind::Banner)
    }

    fn prefix(&self) -> &'static str {
        match self {
            AssetKind::CategoryIcon => "categories",
            AssetKind::CollectionImage => "collections",
            AssetKind::MeditationImage => "meditations",
            AssetKind::EpisodeMedia => "episodes",
            AssetKind::MiracleImage => "image",
            AssetKind::MiracleAudio => "audio",
            AssetKind::Logo => "logo",
            AssetKind::Banner => "banner",
        }
    }

    /// Object path for a new upload with extension `ext`
    pub fn object_path(&self, ext: &str) -> String {
        let name = Uuid::new_v4().simple();
        if self.is_site_asset() {
            format!("{}-{}.{}", self.prefix(), name, ext)
        } else {
            format!("{}/{}.{}", self.prefix(), name, ext)
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// Lower-cased file extension, `bin` when absent
pub fn extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| "bin".to_string())
}

/// MIME type by extension
pub fn content_type(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "ogg" => "audio/ogg",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}

/// Uploads files and returns their public URLs
pub struct AssetUploader<B> {
    blobs: B,
    asset_bucket: String,
    site_bucket: String,
}

impl<B: BlobStore> AssetUploader<B> {
    pub fn new(blobs: B) -> Self {
        Self::with_buckets(blobs, DEFAULT_ASSET_BUCKET, DEFAULT_SITE_BUCKET)
    }

    pub fn with_buckets(
        blobs: B,
        asset_bucket: impl Into<String>,
        site_bucket: impl Into<String>,
    ) -> Self {
        Self {
            blobs,
            asset_bucket: asset_bucket.into(),
            site_bucket: site_bucket.into(),
        }
    }

    pub fn bucket(&self, kind: AssetKind) -> &str {
        if kind.is_site_asset() {
            &self.site_bucket
        } else {
            &self.asset_bucket
        }
    }

    /// Store `bytes` and return the public URL
    pub async fn upload(
        &self,
        kind: AssetKind,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::EmptyFile(file_name.to_string()));
        }

        let ext = extension(file_name);
        let bucket = self.bucket(kind);
        let path = kind.object_path(&ext);

        if let Err(e) = self
            .blobs
            .upload(bucket, &path, bytes, content_type(&ext))
            .await
        {
            error!(bucket, path = %path, error = %e, "Error uploading file");
            return Err(e.into());
        }

        let url = self.blobs.public_url(bucket, &path);
        debug!(kind = %kind, url = %url, "Uploaded");
        Ok(url)
    }
}

/// Upload a new site logo and point the `site_logo` setting at it
pub async fn replace_site_logo<B, S>(
    uploader: &AssetUploader<B>,
    cache: &ContentCache<S>,
    file_name: &str,
    bytes: Vec<u8>,
) -> Result<String, UploadError>
where
    B: BlobStore,
    S: CatalogStore,
{
    let url = uploader.upload(AssetKind::Logo, file_name, bytes).await?;
    cache.set_site_setting(SITE_LOGO_KEY, &url).await?;
    Ok(url)
}

/// Upload a banner image and append an active banner after the existing ones
pub async fn add_banner_from_upload<B, S>(
    uploader: &AssetUploader<B>,
    cache: &ContentCache<S>,
    file_name: &str,
    bytes: Vec<u8>,
    title: Option<String>,
) -> Result<Arc<Banner>, UploadError>
where
    B: BlobStore,
    S: CatalogStore,
{
    let image_url = uploader.upload(AssetKind::Banner, file_name, bytes).await?;
    let sort_order = cache.snapshot().banners().len() as i32 + 1;
    let draft = BannerDraft {
        image_url,
        title,
        sort_order,
        is_active: true,
    };
    Ok(cache.create(&draft).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_paths() {
        let path = AssetKind::MiracleAudio.object_path("mp3");
        assert!(path.starts_with("audio/"));
        assert!(path.ends_with(".mp3"));

        let path = AssetKind::Banner.object_path("png");
        assert!(path.starts_with("banner-"));
        assert!(!path.contains('/'));
    }

    #[test]
    fn test_object_paths_unique() {
        assert_ne!(
            AssetKind::Logo.object_path("png"),
            AssetKind::Logo.object_path("png")
        );
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("Cover.JPG"), "jpg");
        assert_eq!(extension("/tmp/track.final.mp3"), "mp3");
        assert_eq!(extension("README"), "bin");
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type("mp3"), "audio/mpeg");
        assert_eq!(content_type("jpeg"), "image/jpeg");
        assert_eq!(content_type("xyz"), "application/octet-stream");
    }
}
