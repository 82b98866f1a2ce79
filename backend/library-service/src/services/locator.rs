/// Asset locator - maps a video and a requested quality tier onto a file
///
/// Layout under the media root:
///
/// ```text
/// {media_root}/{filename}            original upload
/// {media_root}/{video_id}/1080p.mp4  renditions written by the encoder
/// {media_root}/{video_id}/720p.mp4
/// {media_root}/{video_id}/480p.mp4
/// ```
///
/// Only read-only existence checks happen here, so any number of concurrent
/// requests may locate the same video.
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use uuid::Uuid;
use video_core::{Asset, QualityTier};

use crate::error::{AppError, Result};

/// A concrete file backing a stream response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedFile {
    pub path: PathBuf,
    /// Tier actually served, which differs from the request after a fallback
    pub tier: QualityTier,
    /// Size read from the filesystem now, never from the record
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct AssetLocator {
    media_root: PathBuf,
}

impl AssetLocator {
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
        }
    }

    /// Path of the original upload, or `None` if the stored filename would
    /// resolve outside the media root.
    pub fn original_path(&self, asset: &Asset) -> Option<PathBuf> {
        is_plain_file_name(&asset.filename).then(|| self.media_root.join(&asset.filename))
    }

    pub fn rendition_dir(&self, video_id: Uuid) -> PathBuf {
        self.media_root.join(video_id.to_string())
    }

    /// Resolve `requested` to a file, falling back to the original upload
    /// when the tier is `original`, the rendition directory is absent, or
    /// the tier file is absent.
    pub async fn locate(&self, asset: &Asset, requested: QualityTier) -> Result<LocatedFile> {
        if let Some(file_name) = requested.rendition_file_name() {
            let dir = self.rendition_dir(asset.id);
            if is_dir(&dir).await? {
                let path = dir.join(file_name);
                if let Some(size) = file_size(&path).await? {
                    return Ok(LocatedFile {
                        path,
                        tier: requested,
                        size,
                    });
                }
            }
            tracing::debug!(
                video_id = %asset.id,
                quality = requested.as_str(),
                "rendition unavailable, falling back to original"
            );
        }

        let Some(path) = self.original_path(asset) else {
            tracing::warn!(video_id = %asset.id, filename = %asset.filename, "refusing unsafe filename");
            return Err(AppError::AssetFileMissing);
        };

        match file_size(&path).await? {
            Some(size) => Ok(LocatedFile {
                path,
                tier: QualityTier::Original,
                size,
            }),
            None => {
                tracing::warn!(video_id = %asset.id, path = %path.display(), "video file missing");
                Err(AppError::AssetFileMissing)
            }
        }
    }

    /// Tiers that can be served right now: `original` first, then each
    /// rendition present on disk, highest first.
    pub async fn available_tiers(&self, asset: &Asset) -> Result<Vec<QualityTier>> {
        let mut tiers = vec![QualityTier::Original];
        let dir = self.rendition_dir(asset.id);
        if !is_dir(&dir).await? {
            return Ok(tiers);
        }

        for tier in QualityTier::RENDITIONS {
            if let Some(file_name) = tier.rendition_file_name() {
                if file_size(&dir.join(file_name)).await?.is_some() {
                    tiers.push(tier);
                }
            }
        }
        Ok(tiers)
    }

    /// Remove the original upload and every rendition. Already-missing files
    /// are not an error. Readers holding open handles keep their bytes.
    pub async fn release_files(&self, asset: &Asset) -> Result<()> {
        if let Some(original) = self.original_path(asset) {
            ignore_not_found(tokio::fs::remove_file(&original).await)?;
        }
        ignore_not_found(tokio::fs::remove_dir_all(self.rendition_dir(asset.id)).await)?;

        tracing::info!(video_id = %asset.id, "released video files");
        Ok(())
    }
}

fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

async fn is_dir(path: &Path) -> Result<bool> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_dir()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(AppError::Storage(format!("stat {}: {e}", path.display()))),
    }
}

/// `Some(len)` for a regular file, `None` when absent
async fn file_size(path: &Path) -> Result<Option<u64>> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
        Ok(_) => Ok(None),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::Storage(format!("stat {}: {e}", path.display()))),
    }
}

fn ignore_not_found(result: std::io::Result<()>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AppError::Storage(e.to_string())),
    }
}
