//! Core video library models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::RENDITION_EXTENSION;

/// Account role. Closed set: adding a variant must revisit every match on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Editor,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Editor => "Editor",
            Role::Viewer => "Viewer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Admin" => Some(Role::Admin),
            "Editor" => Some(Role::Editor),
            "Viewer" => Some(Role::Viewer),
            _ => None,
        }
    }
}

/// Moderation/processing state of an uploaded video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoStatus {
    Processing,
    Safe,
    Flagged,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Processing => "Processing",
            VideoStatus::Safe => "Safe",
            VideoStatus::Flagged => "Flagged",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Processing" => Some(VideoStatus::Processing),
            "Safe" => Some(VideoStatus::Safe),
            "Flagged" => Some(VideoStatus::Flagged),
            _ => None,
        }
    }

    /// Terminal states are streamable; `Processing` never is.
    pub fn is_streamable(&self) -> bool {
        !matches!(self, VideoStatus::Processing)
    }
}

/// Named rendition of a source video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    #[serde(rename = "original")]
    Original,
    #[serde(rename = "1080p")]
    Hd1080,
    #[serde(rename = "720p")]
    Hd720,
    #[serde(rename = "480p")]
    Sd480,
}

impl QualityTier {
    /// Transcoded renditions, highest first. `Original` is not a rendition.
    pub const RENDITIONS: [QualityTier; 3] =
        [QualityTier::Hd1080, QualityTier::Hd720, QualityTier::Sd480];

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Original => "original",
            QualityTier::Hd1080 => "1080p",
            QualityTier::Hd720 => "720p",
            QualityTier::Sd480 => "480p",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "original" => Some(QualityTier::Original),
            "1080p" => Some(QualityTier::Hd1080),
            "720p" => Some(QualityTier::Hd720),
            "480p" => Some(QualityTier::Sd480),
            _ => None,
        }
    }

    /// File name of the rendition inside the per-video directory.
    pub fn rendition_file_name(&self) -> Option<String> {
        match self {
            QualityTier::Original => None,
            tier => Some(format!("{}.{}", tier.as_str(), RENDITION_EXTENSION)),
        }
    }
}

/// Authenticated actor of a single request. Immutable once resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn owns(&self, asset: &Asset) -> bool {
        self.user_id == asset.owner_id
    }
}

/// Video record as resolved from the directory.
///
/// `owner_role` is whatever the users table says at lookup time; it is never
/// persisted on the video row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_role: Role,
    pub title: String,
    pub description: Option<String>,
    pub status: VideoStatus,
    pub size_bytes: u64,
    pub mime_type: String,
    /// Original upload, relative to the media root
    pub filename: String,
    pub created_at: DateTime<Utc>,
}

/// Per-owner upload counts for the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadStats {
    pub total_videos: u64,
    pub safe_videos: u64,
    pub flagged_videos: u64,
}

impl UploadStats {
    pub fn tally(statuses: impl IntoIterator<Item = VideoStatus>) -> Self {
        statuses
            .into_iter()
            .fold(Self::default(), |mut stats, status| {
                stats.total_videos += 1;
                match status {
                    VideoStatus::Safe => stats.safe_videos += 1,
                    VideoStatus::Flagged => stats.flagged_videos += 1,
                    VideoStatus::Processing => {}
                }
                stats
            })
    }
}

/// Processing progress pushed to the owner of a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    Started {
        video_id: Uuid,
        title: String,
    },
    Progress {
        video_id: Uuid,
        progress: u8,
        stage: String,
    },
    Completed {
        video_id: Uuid,
        status: VideoStatus,
    },
    Failed {
        video_id: Uuid,
        error: String,
    },
}

impl ProgressEvent {
    pub fn video_id(&self) -> Uuid {
        match self {
            ProgressEvent::Started { video_id, .. }
            | ProgressEvent::Progress { video_id, .. }
            | ProgressEvent::Completed { video_id, .. }
            | ProgressEvent::Failed { video_id, .. } => *video_id,
        }
    }
}
